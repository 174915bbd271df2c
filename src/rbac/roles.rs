//! Role Store Accessor. Soft-deleted roles are invisible to every read and
//! mutation here; there is no way to reach them through this module.

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::errors::{AppError, AppResult};
use crate::models::role::{Role, RoleCreateRequest, RoleUpdateRequest, DEFAULT_ROLE_STATUS};
use crate::utils::utc_now;

const ROLE_COLUMNS: &str = "id, role_name, status, is_deleted, created_at, updated_at";

pub async fn list_roles(pool: &SqlitePool) -> AppResult<Vec<Role>> {
    let roles = sqlx::query_as::<_, Role>(&format!(
        "SELECT {ROLE_COLUMNS} FROM roles WHERE is_deleted = 0 ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(roles)
}

/// Active role by id, or `None` when missing or soft-deleted.
pub async fn find_active_role<'e, E>(executor: E, id: i64) -> AppResult<Option<Role>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let role = sqlx::query_as::<_, Role>(&format!(
        "SELECT {ROLE_COLUMNS} FROM roles WHERE id = ? AND is_deleted = 0"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(role)
}

pub async fn get_role(pool: &SqlitePool, id: i64) -> AppResult<Role> {
    find_active_role(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Role not found"))
}

pub async fn create_role(pool: &SqlitePool, payload: RoleCreateRequest) -> AppResult<Role> {
    validate_role_name(&payload.role_name)?;

    let now = utc_now();
    let status = payload.status.unwrap_or_else(|| DEFAULT_ROLE_STATUS.to_string());

    let result = sqlx::query(
        "INSERT INTO roles (role_name, status, is_deleted, created_at, updated_at) VALUES (?, ?, 0, ?, ?)",
    )
    .bind(&payload.role_name)
    .bind(&status)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get_role(pool, result.last_insert_rowid()).await
}

pub async fn update_role(pool: &SqlitePool, id: i64, payload: RoleUpdateRequest) -> AppResult<Role> {
    let mut role = get_role(pool, id).await?;

    if let Some(role_name) = payload.role_name {
        validate_role_name(&role_name)?;
        role.role_name = role_name;
    }
    if let Some(status) = payload.status {
        role.status = status;
    }

    let now = utc_now();
    sqlx::query("UPDATE roles SET role_name = ?, status = ?, updated_at = ? WHERE id = ?")
        .bind(&role.role_name)
        .bind(&role.status)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    role.updated_at = now;
    Ok(role)
}

/// Soft delete. Grants held by the role are left in place.
pub async fn delete_role(pool: &SqlitePool, id: i64) -> AppResult<Role> {
    let mut role = get_role(pool, id).await?;

    let now = utc_now();
    let affected = sqlx::query("UPDATE roles SET is_deleted = 1, updated_at = ? WHERE id = ? AND is_deleted = 0")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("Role not found"));
    }

    role.is_deleted = true;
    role.updated_at = now;
    Ok(role)
}

fn validate_role_name(role_name: &str) -> AppResult<()> {
    if role_name.trim().is_empty() {
        return Err(AppError::bad_request("role_name must not be empty"));
    }
    Ok(())
}
