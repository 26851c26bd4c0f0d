/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Signed session tokens
/// - [`session`]: The session cookie and resolving it to a user
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::jwt::{create_token, Claims};
/// use taskboard_shared::auth::session::session_cookie;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("hunter22")?;
/// assert!(verify_password("hunter22", &hash)?);
///
/// let token = create_token(&Claims::new(Uuid::new_v4()), "jwt-secret")?;
/// let cookie = session_cookie(token, true);
/// assert_eq!(cookie.name(), "token");
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
pub mod session;
