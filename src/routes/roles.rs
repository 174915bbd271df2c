use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};

use crate::app::AppState;
use crate::errors::AppResult;
use crate::events::{log_activity, RequestContext};
use crate::extract::ApiJson;
use crate::models::role::{Role, RoleCreateRequest, RoleUpdateRequest};
use crate::rbac::roles as store;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/roles", get(list_roles).post(create_role))
        .route("/roles/:id", get(get_role).patch(update_role).delete(delete_role))
}

#[utoipa::path(
    get,
    path = "/roles",
    tag = "Roles",
    responses((status = 200, description = "Active roles, newest first", body = [Role]))
)]
pub async fn list_roles(State(state): State<AppState>) -> AppResult<Json<Vec<Role>>> {
    Ok(Json(store::list_roles(&state.pool).await?))
}

#[utoipa::path(
    get,
    path = "/roles/{id}",
    tag = "Roles",
    params(("id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role detail", body = Role),
        (status = 404, description = "Role not found"),
    )
)]
pub async fn get_role(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Role>> {
    Ok(Json(store::get_role(&state.pool, id).await?))
}

#[utoipa::path(
    post,
    path = "/roles",
    tag = "Roles",
    request_body = RoleCreateRequest,
    responses((status = 201, description = "Role created", body = Role))
)]
pub async fn create_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<RoleCreateRequest>,
) -> AppResult<(StatusCode, Json<Role>)> {
    let role = store::create_role(&state.pool, payload).await?;

    log_activity(
        &state.event_bus,
        "created",
        &role,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    patch,
    path = "/roles/{id}",
    tag = "Roles",
    params(("id" = i64, Path, description = "Role id")),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Role updated", body = Role),
        (status = 404, description = "Role not found"),
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<RoleUpdateRequest>,
) -> AppResult<Json<Role>> {
    let old = store::get_role(&state.pool, id).await?;
    let role = store::update_role(&state.pool, id, payload).await?;

    log_activity(
        &state.event_bus,
        "updated",
        &role,
        Some(&old),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(role))
}

/// Soft delete: the role is flagged and returned, never removed.
#[utoipa::path(
    delete,
    path = "/roles/{id}",
    tag = "Roles",
    params(("id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role soft deleted", body = Role),
        (status = 404, description = "Role not found"),
    )
)]
pub async fn delete_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> AppResult<Json<Role>> {
    let role = store::delete_role(&state.pool, id).await?;
    tracing::info!(role_id = role.id, role = %role.role_name, "role soft deleted");

    log_activity(
        &state.event_bus,
        "deleted",
        &role,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(role))
}
