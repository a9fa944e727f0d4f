use serde::{Deserialize, Serialize};

/// A project role (e.g. "Back", "Design", "Product Owner").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    /// Whether members with this role contribute point estimates.
    #[serde(default)]
    pub computable: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Role {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// A user's membership in a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub role_id: i64,
    #[serde(default)]
    pub is_admin: bool,
}
