use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Capability hierarchy: SUPER_ADMIN ⊇ PLATFORM_AGENT ⊇ AGENT for read
/// scope. An AGENT's write scope is restricted to rows it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "agent_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentRole {
    SuperAdmin,
    PlatformAgent,
    Agent,
}

impl AgentRole {
    /// Internal agents see across the whole platform (all enquiries, all
    /// deals), not just their own rows.
    pub fn is_internal(self) -> bool {
        matches!(self, AgentRole::SuperAdmin | AgentRole::PlatformAgent)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentRole::SuperAdmin => "SUPER_ADMIN",
            AgentRole::PlatformAgent => "PLATFORM_AGENT",
            AgentRole::Agent => "AGENT",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: AgentRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
