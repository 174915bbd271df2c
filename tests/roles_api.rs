mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::message;

#[tokio::test]
async fn role_crud_flow() -> Result<()> {
    let app = common::setup().await?;

    let (status, created) = app
        .send("POST", "/roles", Some(json!({"role_name": "EMPLOYEE"})))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", created);
    assert_eq!(created["role_name"], "EMPLOYEE");
    assert_eq!(created["status"], "ACTIVE");
    assert_eq!(created["is_deleted"], false);
    let id = created["id"].as_i64().expect("id");

    let (status, updated) = app
        .send("PATCH", &format!("/roles/{}", id), Some(json!({"status": "INACTIVE"})))
        .await?;
    assert_eq!(status, StatusCode::OK, "update failed: {}", updated);
    assert_eq!(updated["status"], "INACTIVE");
    assert_eq!(updated["role_name"], "EMPLOYEE");

    let (status, fetched) = app.send("GET", &format!("/roles/{}", id), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "INACTIVE");

    Ok(())
}

#[tokio::test]
async fn soft_delete_hides_role_everywhere() -> Result<()> {
    let app = common::setup().await?;

    let keep = app.create_role("ADMIN").await?;
    let gone = app.create_role("TEMP").await?;

    let (status, deleted) = app.send("DELETE", &format!("/roles/{}", gone), None).await?;
    assert_eq!(status, StatusCode::OK, "soft delete must return 200 with the record");
    assert_eq!(deleted["is_deleted"], true);
    assert_eq!(deleted["id"], gone);

    // row still exists
    let flag: bool = sqlx::query_scalar("SELECT is_deleted FROM roles WHERE id = ?")
        .bind(gone)
        .fetch_one(&app.pool)
        .await?;
    assert!(flag);

    let (status, body) = app.send("GET", &format!("/roles/{}", gone), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(message(&body).contains("Role not found"));

    let (status, _) = app
        .send("PATCH", &format!("/roles/{}", gone), Some(json!({"role_name": "BACK"})))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("DELETE", &format!("/roles/{}", gone), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.assign(gone, &[], false).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, list) = app.send("GET", "/roles", None).await?;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = list.as_array().unwrap().iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![keep]);

    Ok(())
}

#[tokio::test]
async fn soft_delete_keeps_grants() -> Result<()> {
    let app = common::setup().await?;

    app.create_permission("tenants", "VIEW").await?;
    let role = app.create_role("ADMIN").await?;
    app.assign(role, &["tenants_view"], false).await?;

    let (status, _) = app.send("DELETE", &format!("/roles/{}", role), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.grant_rows(role).await?, 1);

    Ok(())
}

#[tokio::test]
async fn list_is_newest_first() -> Result<()> {
    let app = common::setup().await?;

    let first = app.create_role("FIRST").await?;
    let second = app.create_role("SECOND").await?;
    let third = app.create_role("THIRD").await?;

    let (status, list) = app.send("GET", "/roles", None).await?;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = list.as_array().unwrap().iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![third, second, first]);

    Ok(())
}

#[tokio::test]
async fn create_requires_role_name() -> Result<()> {
    let app = common::setup().await?;

    let (status, body) = app.send("POST", "/roles", Some(json!({"status": "ACTIVE"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message(&body).contains("role_name"), "got: {}", body);

    let (status, _) = app.send("POST", "/roles", Some(json!({"role_name": ""}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}
