//! Permission Store Accessor.

use sqlx::SqlitePool;

use crate::errors::{AppError, AppResult};
use crate::models::permission::{Permission, PermissionCreateRequest, PermissionUpdateRequest};
use crate::rbac::keys::build_permission_key;
use crate::utils::{is_unique_violation, utc_now};

pub(crate) const PERMISSION_COLUMNS: &str =
    "id, screen_name, action, description, created_at, updated_at";

pub async fn list_permissions(pool: &SqlitePool) -> AppResult<Vec<Permission>> {
    let permissions = sqlx::query_as::<_, Permission>(&format!(
        "SELECT {PERMISSION_COLUMNS} FROM permissions_master ORDER BY screen_name, action"
    ))
    .fetch_all(pool)
    .await?;

    Ok(permissions)
}

pub async fn get_permission(pool: &SqlitePool, id: i64) -> AppResult<Permission> {
    sqlx::query_as::<_, Permission>(&format!(
        "SELECT {PERMISSION_COLUMNS} FROM permissions_master WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Permission not found"))
}

pub async fn create_permission(pool: &SqlitePool, payload: PermissionCreateRequest) -> AppResult<Permission> {
    validate_screen_name(&payload.screen_name)?;

    let now = utc_now();
    let result = sqlx::query(
        "INSERT INTO permissions_master (screen_name, action, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&payload.screen_name)
    .bind(payload.action)
    .bind(&payload.description)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|err| duplicate_as_conflict(err, &payload.screen_name, payload.action.as_str()))?;

    get_permission(pool, result.last_insert_rowid()).await
}

pub async fn update_permission(
    pool: &SqlitePool,
    id: i64,
    payload: PermissionUpdateRequest,
) -> AppResult<Permission> {
    let mut permission = get_permission(pool, id).await?;

    if let Some(screen_name) = payload.screen_name {
        validate_screen_name(&screen_name)?;
        permission.screen_name = screen_name;
    }
    if let Some(action) = payload.action {
        permission.action = action;
    }
    if payload.description.is_some() {
        permission.description = payload.description;
    }

    let now = utc_now();
    sqlx::query(
        "UPDATE permissions_master SET screen_name = ?, action = ?, description = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&permission.screen_name)
    .bind(permission.action)
    .bind(&permission.description)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|err| duplicate_as_conflict(err, &permission.screen_name, permission.action.as_str()))?;

    permission.updated_at = now;
    Ok(permission)
}

/// Hard delete, refused while any role grant or user override still points at it.
pub async fn delete_permission(pool: &SqlitePool, id: i64) -> AppResult<Permission> {
    let permission = get_permission(pool, id).await?;

    let role_usage: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM role_permissions WHERE permission_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    let override_usage: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_permission_overrides WHERE permission_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;

    if role_usage > 0 || override_usage > 0 {
        return Err(AppError::conflict(format!(
            "Cannot delete permission. It is being used by {} role permission assignment(s) and {} user override(s)",
            role_usage, override_usage
        )));
    }

    sqlx::query("DELETE FROM permissions_master WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(permission)
}

fn validate_screen_name(screen_name: &str) -> AppResult<()> {
    if screen_name.trim().is_empty() {
        return Err(AppError::bad_request("screen_name must not be empty"));
    }
    Ok(())
}

fn duplicate_as_conflict(err: sqlx::Error, screen_name: &str, action: &str) -> AppError {
    if is_unique_violation(&err) {
        AppError::conflict(format!(
            "Permission already exists: {}",
            build_permission_key(screen_name, action)
        ))
    } else {
        AppError::Database(err)
    }
}
