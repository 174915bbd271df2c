use anyhow::Result;
use serde_json::Value;

use rbac_admin::docs::build_openapi;

#[test]
fn openapi_lists_every_route_and_schema() -> Result<()> {
    let doc = serde_json::to_value(build_openapi(8000))?;

    assert_eq!(doc["servers"][0]["url"], "http://localhost:8000");

    let paths = doc["paths"].as_object().expect("paths");
    for path in [
        "/api/health",
        "/permissions",
        "/permissions/{id}",
        "/roles",
        "/roles/{id}",
        "/roles/{id}/permissions",
        "/roles/{id}/permissions/copy/{target_role_id}",
        "/role-permissions/usage",
    ] {
        assert!(paths.contains_key(path), "missing path {}", path);
    }

    let role_permissions = &paths["/roles/{id}/permissions"];
    for method in ["get", "post", "put", "delete"] {
        assert!(role_permissions.get(method).is_some(), "missing {} on role permissions", method);
    }

    let schemas = doc["components"]["schemas"].as_object().expect("schemas");
    for schema in [
        "Permission",
        "PermissionAction",
        "Role",
        "AssignPermissionsRequest",
        "BulkPermissionUpdateRequest",
        "RolePermissionsView",
        "PermissionUsage",
        "PermissionUsageEntry",
        "PermissionUsageReport",
    ] {
        assert!(schemas.contains_key(schema), "missing schema {}", schema);
    }

    let usage = &paths["/role-permissions/usage"]["get"]["responses"]["200"]["content"]["application/json"]["schema"]["$ref"];
    assert_eq!(usage, "#/components/schemas/PermissionUsageReport");
    let variants = schemas["PermissionUsageReport"]["oneOf"].as_array().expect("oneOf");
    assert_eq!(variants.len(), 2);

    let actions: Vec<&str> = schemas["PermissionAction"]["enum"]
        .as_array()
        .expect("enum")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(actions, vec!["VIEW", "CREATE", "EDIT", "DELETE"]);

    Ok(())
}
