use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown permission: {0}")]
pub struct UnknownPermission(pub String);

/// Atomic capability, namespaced as `<resource>:<action>`.
///
/// The set is closed: route tables and role mappings can only reference
/// permissions declared here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "user:view")]
    UserView,
    #[serde(rename = "user:create")]
    UserCreate,
    #[serde(rename = "user:edit")]
    UserEdit,
    #[serde(rename = "user:delete")]
    UserDelete,
    #[serde(rename = "role:view")]
    RoleView,
    #[serde(rename = "role:manage")]
    RoleManage,
    #[serde(rename = "system:config")]
    SystemConfig,
    #[serde(rename = "system:logs")]
    SystemLogs,
    #[serde(rename = "analytics:view")]
    AnalyticsView,
    #[serde(rename = "analytics:export")]
    AnalyticsExport,
}

impl Permission {
    /// Every permission in the closed set.
    pub const ALL: [Permission; 10] = [
        Permission::UserView,
        Permission::UserCreate,
        Permission::UserEdit,
        Permission::UserDelete,
        Permission::RoleView,
        Permission::RoleManage,
        Permission::SystemConfig,
        Permission::SystemLogs,
        Permission::AnalyticsView,
        Permission::AnalyticsExport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::UserView => "user:view",
            Permission::UserCreate => "user:create",
            Permission::UserEdit => "user:edit",
            Permission::UserDelete => "user:delete",
            Permission::RoleView => "role:view",
            Permission::RoleManage => "role:manage",
            Permission::SystemConfig => "system:config",
            Permission::SystemLogs => "system:logs",
            Permission::AnalyticsView => "analytics:view",
            Permission::AnalyticsExport => "analytics:export",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == value)
            .ok_or_else(|| UnknownPermission(value.to_string()))
    }
}
