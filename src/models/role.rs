use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::events::{Loggable, Severity};

pub const DEFAULT_ROLE_STATUS: &str = "ACTIVE";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Role {
    pub id: i64,
    #[schema(example = "EMPLOYEE")]
    pub role_name: String,
    #[schema(example = "ACTIVE")]
    pub status: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for Role {
    fn entity_type() -> &'static str { "role" }
    fn subject_id(&self) -> i64 { self.id }
    fn severity(&self) -> Severity { Severity::Critical }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RoleCreateRequest {
    #[schema(example = "EMPLOYEE")]
    pub role_name: String,
    #[schema(example = "ACTIVE")]
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RoleUpdateRequest {
    #[schema(example = "EMPLOYEE")]
    pub role_name: Option<String>,
    #[schema(example = "ACTIVE")]
    pub status: Option<String>,
}
