use serde::{Deserialize, Serialize};

/// Role identifier used for access control.
///
/// The role set is closed by design: three roles, each gating a disjoint
/// slice of the ledger's mutating surface. A principal may hold several
/// roles at once.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Bootstraps the system and grants/revokes the other two roles.
    Admin,
    /// Writes the yield configuration registry.
    Manager,
    /// Registers deposits, settles withdrawals, triggers reward minting.
    Operator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Operator => "operator",
        }
    }

    /// Roles an admin may grant or revoke. `Admin` itself is fixed at
    /// bootstrap and never changes hands.
    pub fn is_grantable(&self) -> bool {
        matches!(self, Role::Manager | Role::Operator)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
