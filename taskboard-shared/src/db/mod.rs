/// Database plumbing: the connection pool and embedded migrations
///
/// - `pool`: Pool construction, `SELECT 1` health check, usage snapshot
/// - `migrations`: Applies `taskboard-shared/migrations/*.sql` at startup
///
/// ```no_run
/// use taskboard_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     max_connections: 20,
///     ..Default::default()
/// })
/// .await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

pub mod migrations;
pub mod pool;
