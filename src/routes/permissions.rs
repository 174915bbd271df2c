use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};

use crate::app::AppState;
use crate::errors::AppResult;
use crate::events::{log_activity, RequestContext};
use crate::extract::ApiJson;
use crate::models::permission::{Permission, PermissionCreateRequest, PermissionUpdateRequest};
use crate::rbac::permissions as store;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/permissions", get(list_permissions).post(create_permission))
        .route(
            "/permissions/:id",
            get(get_permission).patch(update_permission).delete(delete_permission),
        )
}

#[utoipa::path(
    get,
    path = "/permissions",
    tag = "Permissions",
    responses((status = 200, description = "Permissions ordered by screen and action", body = [Permission]))
)]
pub async fn list_permissions(State(state): State<AppState>) -> AppResult<Json<Vec<Permission>>> {
    Ok(Json(store::list_permissions(&state.pool).await?))
}

#[utoipa::path(
    get,
    path = "/permissions/{id}",
    tag = "Permissions",
    params(("id" = i64, Path, description = "Permission id")),
    responses(
        (status = 200, description = "Permission detail", body = Permission),
        (status = 404, description = "Permission not found"),
    )
)]
pub async fn get_permission(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Permission>> {
    Ok(Json(store::get_permission(&state.pool, id).await?))
}

#[utoipa::path(
    post,
    path = "/permissions",
    tag = "Permissions",
    request_body = PermissionCreateRequest,
    responses(
        (status = 201, description = "Permission created", body = Permission),
        (status = 409, description = "Screen and action already defined"),
    )
)]
pub async fn create_permission(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<PermissionCreateRequest>,
) -> AppResult<(StatusCode, Json<Permission>)> {
    let permission = store::create_permission(&state.pool, payload).await?;
    tracing::info!(permission = %permission.key(), "permission created");

    log_activity(
        &state.event_bus,
        "created",
        &permission,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(permission)))
}

#[utoipa::path(
    patch,
    path = "/permissions/{id}",
    tag = "Permissions",
    params(("id" = i64, Path, description = "Permission id")),
    request_body = PermissionUpdateRequest,
    responses(
        (status = 200, description = "Permission updated", body = Permission),
        (status = 404, description = "Permission not found"),
        (status = 409, description = "Screen and action already defined"),
    )
)]
pub async fn update_permission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<PermissionUpdateRequest>,
) -> AppResult<Json<Permission>> {
    let old = store::get_permission(&state.pool, id).await?;
    let permission = store::update_permission(&state.pool, id, payload).await?;

    log_activity(
        &state.event_bus,
        "updated",
        &permission,
        Some(&old),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(permission))
}

#[utoipa::path(
    delete,
    path = "/permissions/{id}",
    tag = "Permissions",
    params(("id" = i64, Path, description = "Permission id")),
    responses(
        (status = 204, description = "Permission deleted"),
        (status = 404, description = "Permission not found"),
        (status = 409, description = "Permission still granted to roles or user overrides"),
    )
)]
pub async fn delete_permission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let permission = store::delete_permission(&state.pool, id).await?;
    tracing::info!(permission = %permission.key(), "permission deleted");

    log_activity(
        &state.event_bus,
        "deleted",
        &permission,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(StatusCode::NO_CONTENT)
}
