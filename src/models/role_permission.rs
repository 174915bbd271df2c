use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::events::{Loggable, Severity};
use crate::models::permission::{Permission, PermissionAction};
use crate::models::role::Role;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignPermissionsRequest {
    /// Permission keys in the format `screen_action`
    #[schema(example = json!(["tenants_view", "tenants_delete"]))]
    pub permission_keys: Vec<String>,
    #[serde(default)]
    #[schema(example = false)]
    pub replace_all: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemovePermissionsRequest {
    #[schema(example = json!(["tenants_delete"]))]
    pub permission_keys: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkPermissionUpdateRequest {
    /// Map of permission key to granted flag. Only `true` entries are granted.
    #[schema(example = json!({"tenants_view": true, "tenants_delete": false}))]
    pub permissions: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleSummary {
    pub id: i64,
    pub role_name: String,
    pub status: String,
}

impl From<&Role> for RoleSummary {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id,
            role_name: role.role_name.clone(),
            status: role.status.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PermissionWithStatus {
    #[serde(flatten)]
    pub permission: Permission,
    pub granted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GrantSummary {
    pub total_permissions: usize,
    pub granted_permissions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RolePermissionsView {
    pub role: RoleSummary,
    pub permissions: Vec<PermissionWithStatus>,
    pub summary: GrantSummary,
}

/// A role holding a permission, with the number of users assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, FromRow)]
pub struct RoleUsage {
    pub id: i64,
    pub role_name: String,
    pub users_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PermissionUsage {
    #[schema(example = "tenants_view")]
    pub permission_key: String,
    pub roles_using: Vec<RoleUsage>,
    pub total_roles: usize,
    pub total_users_affected: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PermissionUsageEntry {
    #[schema(example = "tenants_view")]
    pub permission_key: String,
    pub screen_name: String,
    pub action: PermissionAction,
    pub description: Option<String>,
    pub roles_count: usize,
    pub users_affected: i64,
    pub roles: Vec<RoleUsage>,
}

/// Usage for one key, or one entry per permission when no key is given.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PermissionUsageReport {
    Single(PermissionUsage),
    All(Vec<PermissionUsageEntry>),
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsageQuery {
    /// Limit the report to one permission key
    pub permission_key: Option<String>,
}

/// Audit record for a change to a role's grant set.
#[derive(Debug, Clone, Serialize)]
pub struct RoleGrantChange {
    pub role_id: i64,
    pub permission_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_role_id: Option<i64>,
}

impl Loggable for RoleGrantChange {
    fn entity_type() -> &'static str { "role_permission" }
    fn subject_id(&self) -> i64 { self.role_id }
    fn severity(&self) -> Severity { Severity::Critical }
}
