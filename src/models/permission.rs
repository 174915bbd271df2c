use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::events::{Loggable, Severity};

/// Operation a permission grants on a screen. Stored upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum PermissionAction {
    View,
    Create,
    Edit,
    Delete,
}

impl PermissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionAction::View => "VIEW",
            PermissionAction::Create => "CREATE",
            PermissionAction::Edit => "EDIT",
            PermissionAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Permission {
    pub id: i64,
    #[schema(example = "tenants")]
    pub screen_name: String,
    pub action: PermissionAction,
    #[schema(example = "Allows viewing tenants")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    /// Human-readable key, e.g. `tenants_view`.
    pub fn key(&self) -> String {
        crate::rbac::keys::build_permission_key(&self.screen_name, self.action.as_str())
    }
}

impl Loggable for Permission {
    fn entity_type() -> &'static str { "permission" }
    fn subject_id(&self) -> i64 { self.id }
    fn severity(&self) -> Severity { Severity::Critical }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionCreateRequest {
    #[schema(example = "tenants")]
    pub screen_name: String,
    pub action: PermissionAction,
    #[schema(example = "Allows viewing tenants")]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PermissionUpdateRequest {
    #[schema(example = "tenants")]
    pub screen_name: Option<String>,
    pub action: Option<PermissionAction>,
    #[schema(example = "Allows viewing tenants")]
    pub description: Option<String>,
}
