//! Caller identities.
//!
//! The ledger only ever sees the opaque string returned by [`Identity::id`];
//! enrollment and role bookkeeping live here and in the identity repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MSP id used when none is configured.
pub const DEFAULT_MSP_ID: &str = "Org1MSP";

/// User id of the registrar identity created by `init`.
pub const ADMIN_USER: &str = "admin";

/// Supplies the caller identity for an invocation.
pub trait Identity {
    fn id(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Registrar, allowed to enroll other users
    Admin,
    Client,
    /// Postal employee
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Client => "client",
            Role::Employee => "employee",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "client" => Some(Role::Client),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn is_postal_employee(&self) -> bool {
        matches!(self, Role::Employee)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user enrolled in the local wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolledIdentity {
    pub user_id: String,
    pub role: Role,
    pub msp_id: String,
    /// Attribute fixed at enrollment, true for employees.
    pub postal_employee: bool,
    pub enrolled_at: DateTime<Utc>,
}

impl EnrolledIdentity {
    pub fn new(user_id: impl Into<String>, role: Role, msp_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            msp_id: msp_id.into(),
            postal_employee: role.is_postal_employee(),
            enrolled_at: Utc::now(),
        }
    }
}

impl Identity for EnrolledIdentity {
    /// `x509::/OU=<role>/CN=<user>::/O=<msp>`
    fn id(&self) -> String {
        format!("x509::/OU={}/CN={}::/O={}", self.role, self.user_id, self.msp_id)
    }
}

/// A fixed identity string, for embedding and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity(pub String);

impl StaticIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Identity for StaticIdentity {
    fn id(&self) -> String {
        self.0.clone()
    }
}
