/// Integration tests for the admin-only user endpoints

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;
use taskboard_api::messages;
use uuid::Uuid;

#[tokio::test]
async fn test_non_admins_are_forbidden() {
    let Some(ctx) = TestContext::new().await else { return };
    let user = ctx.sign_up("ada").await;

    let list = ctx.get("/api/users", &user.cookie).await;
    assert_eq!(list.status, StatusCode::FORBIDDEN);
    assert_eq!(list.body["success"], false);
    assert!(list.body["data"].is_null());

    let own = ctx.get(&format!("/api/users/{}", user.user_id), &user.cookie).await;
    assert_eq!(own.status, StatusCode::FORBIDDEN);

    let promote = ctx
        .put(
            &format!("/api/users/{}", user.user_id),
            &user.cookie,
            json!({ "role": "admin" }),
        )
        .await;
    assert_eq!(promote.status, StatusCode::FORBIDDEN);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_admin_lists_and_reads_users() {
    let Some(ctx) = TestContext::new().await else { return };
    let admin = ctx.sign_up_admin("root").await;
    let user = ctx.sign_up("ada").await;

    let list = ctx.get("/api/users", &admin.cookie).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["message"], messages::USERS_FETCHED);

    let users = list.body["data"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));

    let one = ctx.get(&format!("/api/users/{}", user.user_id), &admin.cookie).await;
    assert_eq!(one.status, StatusCode::OK);
    assert_eq!(one.body["data"]["username"], "ada");
    assert_eq!(one.body["data"]["role"], "user");
    assert!(one.body["data"]["createdAt"].is_string());

    let missing = ctx
        .get(&format!("/api/users/{}", Uuid::new_v4()), &admin.cookie)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["message"], messages::USER_NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_admin_updates_users() {
    let Some(ctx) = TestContext::new().await else { return };
    let admin = ctx.sign_up_admin("root").await;
    let user = ctx.sign_up("ada").await;
    let uri = format!("/api/users/{}", user.user_id);

    let response = ctx
        .put(
            &uri,
            &admin.cookie,
            json!({ "username": "countess", "role": "admin", "password": "ignored" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["message"], messages::USER_UPDATED);
    assert_eq!(response.body["data"]["username"], "countess");
    assert_eq!(response.body["data"]["role"], "admin");
    assert_eq!(response.body["data"]["email"], user.email);

    // The promotion takes effect on the existing session
    let now_admin = ctx.get("/api/users", &user.cookie).await;
    assert_eq!(now_admin.status, StatusCode::OK);

    // The password was not touched
    let login = ctx
        .send(
            axum::http::Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": user.email, "password": common::PASSWORD })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);

    let taken = ctx
        .put(&uri, &admin.cookie, json!({ "email": admin.email.to_uppercase() }))
        .await;
    assert_eq!(taken.status, StatusCode::CONFLICT);

    let invalid = ctx.put(&uri, &admin.cookie, json!({ "email": "nope" })).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

    let bad_role = ctx.put(&uri, &admin.cookie, json!({ "role": "owner" })).await;
    assert_eq!(bad_role.status, StatusCode::BAD_REQUEST);

    let unchanged = ctx.put(&uri, &admin.cookie, json!({})).await;
    assert_eq!(unchanged.status, StatusCode::OK);
    assert_eq!(unchanged.body["data"]["username"], "countess");

    let missing = ctx
        .put(
            &format!("/api/users/{}", Uuid::new_v4()),
            &admin.cookie,
            json!({ "username": "ghost" }),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_admin_deletes_users() {
    let Some(ctx) = TestContext::new().await else { return };
    let admin = ctx.sign_up_admin("root").await;
    let user = ctx.sign_up("ada").await;
    let uri = format!("/api/users/{}", user.user_id);

    let task_id = ctx.create_task(&user.cookie, json!({ "title": "Left behind" })).await;

    let deleted = ctx.delete(&uri, &admin.cookie).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], messages::USER_DELETED);

    let gone = ctx.get(&uri, &admin.cookie).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let again = ctx.delete(&uri, &admin.cookie).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    // Their tasks survive with a dangling creator
    let task = ctx.get(&format!("/api/tasks/{task_id}"), &admin.cookie).await;
    assert_eq!(task.status, StatusCode::OK);
    assert!(task.body["data"]["createdBy"].is_null());

    ctx.cleanup().await;
}
