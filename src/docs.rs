use std::sync::Arc;

use axum::{routing::get, Json, Router};
use utoipa::openapi::server::Server;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::permissions::list_permissions,
		routes::permissions::get_permission,
		routes::permissions::create_permission,
		routes::permissions::update_permission,
		routes::permissions::delete_permission,
		routes::roles::list_roles,
		routes::roles::get_role,
		routes::roles::create_role,
		routes::roles::update_role,
		routes::roles::delete_role,
		routes::role_permissions::get_role_permissions,
		routes::role_permissions::assign_permissions,
		routes::role_permissions::remove_permissions,
		routes::role_permissions::bulk_update_permissions,
		routes::role_permissions::copy_permissions,
		routes::role_permissions::get_permission_usage
	),
	components(
		schemas(
			routes::health::HealthResponse,
			models::permission::Permission,
			models::permission::PermissionAction,
			models::permission::PermissionCreateRequest,
			models::permission::PermissionUpdateRequest,
			models::role::Role,
			models::role::RoleCreateRequest,
			models::role::RoleUpdateRequest,
			models::role_permission::AssignPermissionsRequest,
			models::role_permission::RemovePermissionsRequest,
			models::role_permission::BulkPermissionUpdateRequest,
			models::role_permission::RoleSummary,
			models::role_permission::PermissionWithStatus,
			models::role_permission::GrantSummary,
			models::role_permission::RolePermissionsView,
			models::role_permission::RoleUsage,
			models::role_permission::PermissionUsage,
			models::role_permission::PermissionUsageEntry,
			models::role_permission::PermissionUsageReport
		)
	),
	tags(
		(name = "Health", description = "Service health"),
		(name = "Permissions", description = "Permission definitions"),
		(name = "Roles", description = "Role management"),
		(name = "Role Permissions", description = "Granting permissions to roles")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> utoipa::openapi::OpenApi {
	let mut doc = ApiDoc::openapi();
	doc.servers = Some(vec![Server::new(format!("http://localhost:{}", port))]);
	doc
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true);

	// serve the JSON ourselves so the UI fetches exactly what we built
	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = {
		let doc_json = Arc::clone(&doc_json);
		get(move || {
			let doc_json = Arc::clone(&doc_json);
			async move { Json((*doc_json).clone()) }
		})
	};

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}
