use serde::{Deserialize, Serialize};
use std::fmt;

/// Roles the clinic backend can attach to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Therapist,
    Parent,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Therapist, Role::Parent];

    /// Case-insensitive parse of a raw role string. Backend payloads are not
    /// consistent about casing, so "Admin" and "admin" both resolve.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "therapist" => Some(Role::Therapist),
            "parent" => Some(Role::Parent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Therapist => "therapist",
            Role::Parent => "parent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the router currently believes about the signed-in user.
///
/// `role` is `None` while unauthenticated. `ready` reflects whether a live
/// tree is attached; commands issued while it is false are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub role: Option<Role>,
    pub ready: bool,
}

impl Session {
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub fn signed_in(role: Role) -> Self {
        Self {
            role: Some(role),
            ready: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.role.is_some()
    }
}

/// Subset of the backend user document the navigation layer cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub role: String,
}

impl UserClaims {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
        }
    }
}
