use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Write-only session audit row. Populated by the session enricher,
/// never consulted by request handling; membership changes mid-session
/// are not reflected here.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_sessions")]
pub struct Model {
    /// Token id of the session this snapshot belongs to
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: String,

    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    /// JSON-encoded list of group names at login time
    pub groups: String,
    pub is_admin: bool,
    pub login_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
