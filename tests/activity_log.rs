mod common;

use std::time::Duration;

use anyhow::{bail, Result};
use axum::http::StatusCode;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use rbac_admin::events::verify_activity_chain;

async fn wait_for_events(pool: &SqlitePool, expected: i64) -> Result<Vec<String>> {
    for _ in 0..100 {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_log")
            .fetch_one(pool)
            .await?;
        if count >= expected {
            let names = sqlx::query_scalar("SELECT event_name FROM activity_log ORDER BY id")
                .fetch_all(pool)
                .await?;
            return Ok(names);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    bail!("activity log never reached {} rows", expected)
}

#[tokio::test]
async fn mutations_are_recorded_in_order() -> Result<()> {
    let app = common::setup().await?;

    let permission = app.create_permission("tenants", "VIEW").await?;
    let source = app.create_role("ADMIN").await?;
    let target = app.create_role("EMPLOYEE").await?;
    app.assign(source, &["tenants_view"], false).await?;

    let (status, _) = app
        .send("POST", &format!("/roles/{}/permissions/copy/{}", source, target), None)
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send("DELETE", &format!("/roles/{}", target), None).await?;
    assert_eq!(status, StatusCode::OK);

    let names = wait_for_events(&app.pool, 6).await?;
    assert_eq!(
        names,
        vec![
            "permission.created",
            "role.created",
            "role.created",
            "role_permission.assigned",
            "role_permission.copied",
            "role.deleted",
        ]
    );

    let (subject, severity, properties): (Option<i64>, String, String) = sqlx::query_as(
        "SELECT subject_id, severity, properties FROM activity_log WHERE event_name = 'permission.created'",
    )
    .fetch_one(&app.pool)
    .await?;
    assert_eq!(subject, Some(permission));
    assert_eq!(severity, "critical");

    let event: Value = serde_json::from_str(&properties)?;
    assert_eq!(event["payload"]["new"]["screen_name"], "tenants");

    assert!(verify_activity_chain(&app.pool).await?);

    Ok(())
}

#[tokio::test]
async fn failed_mutations_are_not_recorded() -> Result<()> {
    let app = common::setup().await?;

    let role = app.create_role("ADMIN").await?;
    let (status, _) = app.assign(role, &["ghost_view"], false).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send("POST", "/permissions", Some(json!({"screen_name": "", "action": "VIEW"})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // a later successful write flushes everything queued before it
    app.create_permission("tenants", "VIEW").await?;

    let names = wait_for_events(&app.pool, 2).await?;
    assert_eq!(names, vec!["role.created", "permission.created"]);

    Ok(())
}

#[tokio::test]
async fn tampering_breaks_the_chain() -> Result<()> {
    let app = common::setup().await?;

    app.create_role("ADMIN").await?;
    app.create_role("EMPLOYEE").await?;
    wait_for_events(&app.pool, 2).await?;
    assert!(verify_activity_chain(&app.pool).await?);

    sqlx::query("UPDATE activity_log SET properties = '{}' WHERE id = (SELECT MIN(id) FROM activity_log)")
        .execute(&app.pool)
        .await?;
    assert!(!verify_activity_chain(&app.pool).await?);

    Ok(())
}
