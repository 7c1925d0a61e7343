use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Dashboard role. Drives default room subscriptions and command rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Operator,
    Analyst,
    Viewer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Operator => "operator",
            Self::Analyst => "analyst",
            Self::Viewer => "viewer",
        }
    }

    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }

    /// Admins and operators run the operations center and may issue control commands.
    pub fn is_operations(self) -> bool {
        matches!(self, Self::Admin | Self::Operator)
    }

    pub fn is_analytics(self) -> bool {
        matches!(self, Self::Admin | Self::Analyst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    TrafficManagement,
    Emergency,
    Planning,
    Operations,
    Analytics,
}

/// A stored dashboard user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    pub department: Department,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// The identity a connection or request acts as, resolved once from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub department: Department,
}

impl Identity {
    /// Emergency responders and admins may raise emergency alerts.
    pub fn can_raise_emergency(&self) -> bool {
        self.department == Department::Emergency || self.role == Role::Admin
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            department: user.department,
        }
    }
}
