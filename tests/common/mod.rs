#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use rbac_admin::create_app;

pub struct TestApp {
    // keeps the database file alive for the duration of the test
    _dir: TempDir,
    pub pool: SqlitePool,
    pub router: Router,
}

pub async fn setup() -> Result<TestApp> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator =
        sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    let router = create_app(pool.clone()).await;

    Ok(TestApp { _dir: dir, pool, router })
}

impl TestApp {
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let resp = self.router.clone().oneshot(req).await?;
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .with_context(|| format!("non-json body: {}", String::from_utf8_lossy(&bytes)))?
        };

        Ok((status, value))
    }

    pub async fn create_permission(&self, screen_name: &str, action: &str) -> Result<i64> {
        let (status, body) = self
            .send(
                "POST",
                "/permissions",
                Some(json!({"screen_name": screen_name, "action": action})),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "create permission failed: {}", body);
        body.get("id").and_then(Value::as_i64).context("missing permission id")
    }

    pub async fn create_role(&self, role_name: &str) -> Result<i64> {
        let (status, body) = self
            .send("POST", "/roles", Some(json!({"role_name": role_name})))
            .await?;
        assert_eq!(status, StatusCode::CREATED, "create role failed: {}", body);
        body.get("id").and_then(Value::as_i64).context("missing role id")
    }

    /// Users belong to the user-management service; insert them directly.
    pub async fn add_user(&self, username: &str, role_id: i64) -> Result<i64> {
        let result = sqlx::query("INSERT INTO users (username, role_id) VALUES (?, ?)")
            .bind(username)
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn add_override(&self, user_id: i64, permission_id: i64) -> Result<()> {
        sqlx::query("INSERT INTO user_permission_overrides (user_id, permission_id, granted) VALUES (?, ?, 1)")
            .bind(user_id)
            .bind(permission_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn assign(&self, role_id: i64, keys: &[&str], replace_all: bool) -> Result<(StatusCode, Value)> {
        self.send(
            "POST",
            &format!("/roles/{}/permissions", role_id),
            Some(json!({"permission_keys": keys, "replace_all": replace_all})),
        )
        .await
    }

    /// Keys of the permissions currently granted to `role_id`, in listing order.
    pub async fn granted_keys(&self, role_id: i64) -> Result<Vec<String>> {
        let (status, body) = self
            .send("GET", &format!("/roles/{}/permissions", role_id), None)
            .await?;
        assert_eq!(status, StatusCode::OK, "get role permissions failed: {}", body);

        let permissions = body
            .get("permissions")
            .and_then(Value::as_array)
            .context("missing permissions")?;

        Ok(permissions
            .iter()
            .filter(|p| p.get("granted").and_then(Value::as_bool).unwrap_or(false))
            .map(|p| {
                let screen = p.get("screen_name").and_then(Value::as_str).unwrap_or_default();
                let action = p.get("action").and_then(Value::as_str).unwrap_or_default();
                format!("{}_{}", screen, action.to_lowercase())
            })
            .collect())
    }

    pub async fn grant_rows(&self, role_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM role_permissions WHERE role_id = ?")
            .bind(role_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

pub fn message(body: &Value) -> String {
    body.get("message").and_then(Value::as_str).unwrap_or_default().to_string()
}
