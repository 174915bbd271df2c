//! Role-permission assignment endpoints.
//!
//! Grants are addressed by permission key (`tenants_view`). Every change is
//! written to the activity log as a `role_permission.*` event.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::app::AppState;
use crate::errors::AppResult;
use crate::events::{log_activity, RequestContext};
use crate::extract::ApiJson;
use crate::models::role::Role;
use crate::models::role_permission::*;
use crate::rbac::assignments;

// axum needs one parameter name per segment position, so every `/roles/...`
// route calls the role segment `id`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/roles/:id/permissions",
            get(get_role_permissions)
                .post(assign_permissions)
                .put(bulk_update_permissions)
                .delete(remove_permissions),
        )
        .route(
            "/roles/:id/permissions/copy/:target_role_id",
            post(copy_permissions),
        )
        .route("/role-permissions/usage", get(get_permission_usage))
}

fn log_grant_change(
    state: &AppState,
    headers: &HeaderMap,
    action: &str,
    change: RoleGrantChange,
) {
    log_activity(
        &state.event_bus,
        action,
        &change,
        None,
        Some(RequestContext::from_headers(headers)),
    );
}

#[utoipa::path(
    get,
    path = "/roles/{id}/permissions",
    tag = "Role Permissions",
    params(("id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, description = "Every permission flagged with whether the role holds it", body = RolePermissionsView),
        (status = 404, description = "Role not found"),
    )
)]
pub async fn get_role_permissions(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
) -> AppResult<Json<RolePermissionsView>> {
    Ok(Json(assignments::get_role_permissions(&state.pool, role_id).await?))
}

#[utoipa::path(
    post,
    path = "/roles/{id}/permissions",
    tag = "Role Permissions",
    params(("id" = i64, Path, description = "Role id")),
    request_body = AssignPermissionsRequest,
    responses(
        (status = 200, description = "Permissions assigned", body = Role),
        (status = 400, description = "Invalid or unknown permission keys"),
        (status = 404, description = "Role not found"),
    )
)]
pub async fn assign_permissions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(role_id): Path<i64>,
    ApiJson(payload): ApiJson<AssignPermissionsRequest>,
) -> AppResult<Json<Role>> {
    let (role, permission_ids) =
        assignments::assign_permissions(&state.pool, role_id, &payload.permission_keys, payload.replace_all)
            .await?;

    tracing::info!(role_id, count = permission_ids.len(), replace_all = payload.replace_all, "permissions assigned");
    log_grant_change(
        &state,
        &headers,
        "assigned",
        RoleGrantChange { role_id, permission_ids, source_role_id: None },
    );

    Ok(Json(role))
}

#[utoipa::path(
    delete,
    path = "/roles/{id}/permissions",
    tag = "Role Permissions",
    params(("id" = i64, Path, description = "Role id")),
    request_body = RemovePermissionsRequest,
    responses(
        (status = 200, description = "Permissions removed", body = Role),
        (status = 400, description = "Invalid or unknown permission keys"),
        (status = 404, description = "Role not found"),
    )
)]
pub async fn remove_permissions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(role_id): Path<i64>,
    ApiJson(payload): ApiJson<RemovePermissionsRequest>,
) -> AppResult<Json<Role>> {
    let (role, permission_ids) =
        assignments::remove_permissions(&state.pool, role_id, &payload.permission_keys).await?;

    log_grant_change(
        &state,
        &headers,
        "removed",
        RoleGrantChange { role_id, permission_ids, source_role_id: None },
    );

    Ok(Json(role))
}

#[utoipa::path(
    put,
    path = "/roles/{id}/permissions",
    tag = "Role Permissions",
    params(("id" = i64, Path, description = "Role id")),
    request_body = BulkPermissionUpdateRequest,
    responses(
        (status = 200, description = "Grant set replaced by the keys mapped to true", body = Role),
        (status = 400, description = "Invalid or unknown permission keys"),
        (status = 404, description = "Role not found"),
    )
)]
pub async fn bulk_update_permissions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(role_id): Path<i64>,
    ApiJson(payload): ApiJson<BulkPermissionUpdateRequest>,
) -> AppResult<Json<Role>> {
    let (role, permission_ids) =
        assignments::bulk_update_permissions(&state.pool, role_id, &payload.permissions).await?;

    log_grant_change(
        &state,
        &headers,
        "bulk_updated",
        RoleGrantChange { role_id, permission_ids, source_role_id: None },
    );

    Ok(Json(role))
}

#[utoipa::path(
    post,
    path = "/roles/{id}/permissions/copy/{target_role_id}",
    tag = "Role Permissions",
    params(
        ("id" = i64, Path, description = "Role to copy grants from"),
        ("target_role_id" = i64, Path, description = "Role whose grants are replaced"),
    ),
    responses(
        (status = 200, description = "Target role now holds the source role's grants", body = Role),
        (status = 404, description = "Source or target role not found"),
    )
)]
pub async fn copy_permissions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((source_role_id, target_role_id)): Path<(i64, i64)>,
) -> AppResult<Json<Role>> {
    let (_source, target, permission_ids) =
        assignments::copy_permissions(&state.pool, source_role_id, target_role_id).await?;

    log_grant_change(
        &state,
        &headers,
        "copied",
        RoleGrantChange {
            role_id: target_role_id,
            permission_ids,
            source_role_id: Some(source_role_id),
        },
    );

    Ok(Json(target))
}

/// Without `permission_key` the response is an array with one entry per
/// permission; with it, a single usage object.
#[utoipa::path(
    get,
    path = "/role-permissions/usage",
    tag = "Role Permissions",
    params(UsageQuery),
    responses(
        (status = 200, description = "Usage for one key, or one entry per permission", body = PermissionUsageReport),
        (status = 400, description = "Invalid or unknown permission key"),
    )
)]
pub async fn get_permission_usage(
    State(state): State<AppState>,
    Query(query): Query<UsageQuery>,
) -> AppResult<Json<PermissionUsageReport>> {
    let key = query.permission_key.as_deref().filter(|key| !key.is_empty());
    let report = assignments::get_permission_usage(&state.pool, key).await?;
    Ok(Json(report))
}
