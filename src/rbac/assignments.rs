//! Role-Permission Assignment Engine.
//!
//! Clients address permissions by key (`tenants_view`). Every mutating
//! operation resolves all keys up front and fails the whole call, naming every
//! bad key, before touching `role_permissions`. Replace-style updates run the
//! delete and the re-insert in one transaction.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::errors::{AppError, AppResult};
use crate::models::permission::Permission;
use crate::models::role::Role;
use crate::models::role_permission::{
    GrantSummary, PermissionUsage, PermissionUsageEntry, PermissionUsageReport, PermissionWithStatus,
    RolePermissionsView, RoleSummary, RoleUsage,
};
use crate::rbac::keys::{parse_permission_key, ParsedKey};
use crate::rbac::permissions::{list_permissions, PERMISSION_COLUMNS};
use crate::rbac::roles::find_active_role;
use crate::utils::join_keys;

// Two bind variables per row keeps each statement under SQLite's default
// limit of 999 host parameters.
const BIND_CHUNK: usize = 400;

/// Keys resolved to permission ids. `permission_ids` follows the input order,
/// duplicates included.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPermissions {
    pub permission_ids: Vec<i64>,
    pub permissions: Vec<Permission>,
}

pub async fn resolve_permissions_from_keys(
    pool: &SqlitePool,
    permission_keys: &[String],
) -> AppResult<ResolvedPermissions> {
    let mut invalid = Vec::new();
    let mut pairs = BTreeSet::new();
    for key in permission_keys {
        match parse_permission_key(key) {
            Some(parsed) => {
                pairs.insert(parsed);
            }
            None => invalid.push(key.as_str()),
        }
    }

    if !invalid.is_empty() {
        return Err(AppError::bad_request(format!("Invalid permission keys: {}", join_keys(&invalid))));
    }

    if pairs.is_empty() {
        return Ok(ResolvedPermissions::default());
    }

    let permissions = fetch_by_pairs(pool, &pairs).await?;
    let permission_ids = map_keys_to_ids(permission_keys, &permissions)?;

    Ok(ResolvedPermissions { permission_ids, permissions })
}

async fn fetch_by_pairs(pool: &SqlitePool, pairs: &BTreeSet<ParsedKey>) -> AppResult<Vec<Permission>> {
    let pairs: Vec<&ParsedKey> = pairs.iter().collect();
    let mut permissions = Vec::new();

    for chunk in pairs.chunks(BIND_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions_master WHERE "
        ));
        for (i, pair) in chunk.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push("(screen_name = ")
                .push_bind(pair.screen_name.clone())
                .push(" AND action = ")
                .push_bind(pair.action.clone())
                .push(")");
        }

        permissions.extend(qb.build_query_as::<Permission>().fetch_all(pool).await?);
    }

    Ok(permissions)
}

/// Map every requested key through the canonical keys of `found`. A key that
/// matched a row but not its canonical spelling (`tenants_VIEW`) is missing.
fn map_keys_to_ids(permission_keys: &[String], found: &[Permission]) -> AppResult<Vec<i64>> {
    let key_to_id: HashMap<String, i64> = found.iter().map(|p| (p.key(), p.id)).collect();

    let missing: Vec<&str> = permission_keys
        .iter()
        .filter(|k| !key_to_id.contains_key(k.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::bad_request(format!("Permission keys not found: {}", join_keys(&missing))));
    }

    Ok(permission_keys.iter().map(|k| key_to_id[k.as_str()]).collect())
}

async fn require_role(pool: &SqlitePool, role_id: i64, message: &str) -> AppResult<Role> {
    find_active_role(pool, role_id)
        .await?
        .ok_or_else(|| AppError::not_found(message))
}

async fn insert_grants(conn: &mut SqliteConnection, role_id: i64, permission_ids: &[i64]) -> AppResult<()> {
    // (role_id, permission_id) is the primary key, so re-granting is a no-op
    for chunk in permission_ids.chunks(BIND_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new("INSERT OR IGNORE INTO role_permissions (role_id, permission_id) ");
        qb.push_values(chunk, |mut row, permission_id| {
            row.push_bind(role_id).push_bind(*permission_id);
        });
        qb.build().execute(&mut *conn).await?;
    }

    Ok(())
}

async fn delete_grants(conn: &mut SqliteConnection, role_id: i64, permission_ids: &[i64]) -> AppResult<()> {
    for chunk in permission_ids.chunks(BIND_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM role_permissions WHERE role_id = ");
        qb.push_bind(role_id).push(" AND permission_id IN (");
        let mut ids = qb.separated(", ");
        for id in chunk {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
        qb.build().execute(&mut *conn).await?;
    }

    Ok(())
}

async fn clear_grants(conn: &mut SqliteConnection, role_id: i64) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM role_permissions WHERE role_id = ?")
        .bind(role_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

// Grant transactions must open with a write. A deferred transaction that
// reads first gets SQLITE_BUSY, without waiting, when it upgrades to a writer.

async fn add_grants(pool: &SqlitePool, role_id: i64, permission_ids: &[i64]) -> AppResult<()> {
    if permission_ids.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    insert_grants(&mut tx, role_id, permission_ids).await?;
    tx.commit().await?;
    Ok(())
}

async fn replace_grants(pool: &SqlitePool, role_id: i64, permission_ids: &[i64]) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    let cleared = clear_grants(&mut tx, role_id).await?;
    insert_grants(&mut tx, role_id, permission_ids).await?;
    tx.commit().await?;

    tracing::debug!(role_id, cleared, granted = permission_ids.len(), "replaced role grants");
    Ok(())
}

async fn granted_ids(pool: &SqlitePool, role_id: i64) -> AppResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT permission_id FROM role_permissions WHERE role_id = ? ORDER BY permission_id",
    )
    .bind(role_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

pub async fn assign_permissions(
    pool: &SqlitePool,
    role_id: i64,
    permission_keys: &[String],
    replace_all: bool,
) -> AppResult<(Role, Vec<i64>)> {
    let role = require_role(pool, role_id, "Role not found").await?;
    let resolved = resolve_permissions_from_keys(pool, permission_keys).await?;

    if replace_all {
        replace_grants(pool, role_id, &resolved.permission_ids).await?;
    } else {
        add_grants(pool, role_id, &resolved.permission_ids).await?;
    }

    Ok((role, resolved.permission_ids))
}

pub async fn remove_permissions(
    pool: &SqlitePool,
    role_id: i64,
    permission_keys: &[String],
) -> AppResult<(Role, Vec<i64>)> {
    let role = require_role(pool, role_id, "Role not found").await?;
    let resolved = resolve_permissions_from_keys(pool, permission_keys).await?;

    if !resolved.permission_ids.is_empty() {
        let mut tx = pool.begin().await?;
        delete_grants(&mut tx, role_id, &resolved.permission_ids).await?;
        tx.commit().await?;
    }

    Ok((role, resolved.permission_ids))
}

/// Keys mapped to `true` become the role's entire grant set. Keys mapped to
/// `false` are dropped without being looked up, so unknown keys with a
/// `false` value are accepted.
pub fn selected_keys(permissions: &BTreeMap<String, bool>) -> Vec<String> {
    permissions
        .iter()
        .filter(|(_, granted)| **granted)
        .map(|(key, _)| key.clone())
        .collect()
}

pub async fn bulk_update_permissions(
    pool: &SqlitePool,
    role_id: i64,
    permissions: &BTreeMap<String, bool>,
) -> AppResult<(Role, Vec<i64>)> {
    let role = require_role(pool, role_id, "Role not found").await?;
    let resolved = resolve_permissions_from_keys(pool, &selected_keys(permissions)).await?;

    replace_grants(pool, role_id, &resolved.permission_ids).await?;

    Ok((role, resolved.permission_ids))
}

pub async fn get_role_permissions(pool: &SqlitePool, role_id: i64) -> AppResult<RolePermissionsView> {
    let role = require_role(pool, role_id, "Role not found").await?;

    let all_permissions = list_permissions(pool).await?;
    let granted: HashSet<i64> = granted_ids(pool, role_id).await?.into_iter().collect();

    let total_permissions = all_permissions.len();
    let permissions = all_permissions
        .into_iter()
        .map(|permission| PermissionWithStatus {
            granted: granted.contains(&permission.id),
            permission,
        })
        .collect();

    Ok(RolePermissionsView {
        role: RoleSummary::from(&role),
        permissions,
        summary: GrantSummary {
            total_permissions,
            granted_permissions: granted.len(),
        },
    })
}

/// Make `target`'s grants an exact copy of `source`'s. The source ids are
/// captured before the target is cleared, so copying a role onto itself
/// leaves its grants unchanged.
pub async fn copy_permissions(
    pool: &SqlitePool,
    source_role_id: i64,
    target_role_id: i64,
) -> AppResult<(Role, Role, Vec<i64>)> {
    let source = find_active_role(pool, source_role_id).await?;
    let target = find_active_role(pool, target_role_id).await?;

    let source = source.ok_or_else(|| AppError::not_found("Source role not found"))?;
    let target = target.ok_or_else(|| AppError::not_found("Target role not found"))?;

    let source_ids = granted_ids(pool, source_role_id).await?;
    replace_grants(pool, target_role_id, &source_ids).await?;

    tracing::info!(
        source = %source.role_name,
        target = %target.role_name,
        copied = source_ids.len(),
        "copied role permissions"
    );

    Ok((source, target, source_ids))
}

const ROLE_USAGE_SELECT: &str = "r.id, r.role_name, (SELECT COUNT(*) FROM users u WHERE u.role_id = r.id) AS users_count";

#[derive(Debug, FromRow)]
struct GrantUsageRow {
    permission_id: i64,
    id: i64,
    role_name: String,
    users_count: i64,
}

pub async fn get_permission_usage(
    pool: &SqlitePool,
    permission_key: Option<&str>,
) -> AppResult<PermissionUsageReport> {
    match permission_key {
        Some(key) => single_permission_usage(pool, key).await.map(PermissionUsageReport::Single),
        None => all_permission_usage(pool).await.map(PermissionUsageReport::All),
    }
}

// An unknown key is reported as BadRequest, not NotFound.
async fn single_permission_usage(pool: &SqlitePool, permission_key: &str) -> AppResult<PermissionUsage> {
    let parsed = parse_permission_key(permission_key)
        .ok_or_else(|| AppError::bad_request(format!("Invalid permission key: {}", permission_key)))?;

    let permission = sqlx::query_as::<_, Permission>(&format!(
        "SELECT {PERMISSION_COLUMNS} FROM permissions_master WHERE screen_name = ? AND action = ? LIMIT 1"
    ))
    .bind(&parsed.screen_name)
    .bind(&parsed.action)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::bad_request(format!("Permission key not found: {}", permission_key)))?;

    let roles_using = sqlx::query_as::<_, RoleUsage>(&format!(
        "SELECT {ROLE_USAGE_SELECT} FROM role_permissions rp JOIN roles r ON r.id = rp.role_id WHERE rp.permission_id = ? ORDER BY r.id"
    ))
    .bind(permission.id)
    .fetch_all(pool)
    .await?;

    let total_users_affected = roles_using.iter().map(|r| r.users_count).sum();
    Ok(PermissionUsage {
        permission_key: permission_key.to_string(),
        total_roles: roles_using.len(),
        total_users_affected,
        roles_using,
    })
}

async fn all_permission_usage(pool: &SqlitePool) -> AppResult<Vec<PermissionUsageEntry>> {
    let permissions = list_permissions(pool).await?;
    let grants = sqlx::query_as::<_, GrantUsageRow>(&format!(
        "SELECT rp.permission_id, {ROLE_USAGE_SELECT} FROM role_permissions rp JOIN roles r ON r.id = rp.role_id ORDER BY rp.permission_id, r.id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(summarize_usage(permissions, grants))
}

fn summarize_usage(permissions: Vec<Permission>, grants: Vec<GrantUsageRow>) -> Vec<PermissionUsageEntry> {
    let mut roles_by_permission: HashMap<i64, Vec<RoleUsage>> = HashMap::new();
    for grant in grants {
        roles_by_permission.entry(grant.permission_id).or_default().push(RoleUsage {
            id: grant.id,
            role_name: grant.role_name,
            users_count: grant.users_count,
        });
    }

    permissions
        .into_iter()
        .map(|permission| {
            let roles = roles_by_permission.remove(&permission.id).unwrap_or_default();
            PermissionUsageEntry {
                permission_key: permission.key(),
                roles_count: roles.len(),
                users_affected: roles.iter().map(|r| r.users_count).sum(),
                screen_name: permission.screen_name,
                action: permission.action,
                description: permission.description,
                roles,
            }
        })
        .collect()
}
