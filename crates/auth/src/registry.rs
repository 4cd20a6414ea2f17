use std::collections::{HashMap, HashSet};

use coinstake_core::Address;

use crate::{AuthzError, Role};

/// In-memory role membership store.
///
/// Membership is mutated only through admin-gated `grant_role`/`revoke_role`;
/// the admin set itself is fixed at construction. Holding the registry by
/// value (rather than behind a global) makes the single-writer discipline an
/// explicit contract of whoever owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRegistry {
    grants: HashMap<Address, HashSet<Role>>,
}

impl RoleRegistry {
    /// Bootstrap a registry with `admin` as the sole admin principal.
    pub fn new(admin: Address) -> Self {
        let mut grants = HashMap::new();
        grants.insert(admin, HashSet::from([Role::Admin]));
        Self { grants }
    }

    pub fn has_role(&self, principal: Address, role: Role) -> bool {
        self.grants
            .get(&principal)
            .is_some_and(|roles| roles.contains(&role))
    }

    /// All roles held by `principal`, in stable (enum) order.
    pub fn roles_of(&self, principal: Address) -> Vec<Role> {
        let mut roles: Vec<Role> = self
            .grants
            .get(&principal)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        roles.sort();
        roles
    }

    /// Grant `role` to `grantee`. Caller must be an admin; only the
    /// grantable roles (manager, operator) are accepted. Granting a role the
    /// grantee already holds is a no-op.
    pub fn grant_role(
        &mut self,
        caller: Address,
        grantee: Address,
        role: Role,
    ) -> Result<(), AuthzError> {
        self.ensure_admin(caller)?;
        if !role.is_grantable() {
            return Err(AuthzError::Unauthorized(Role::Admin));
        }
        self.grants.entry(grantee).or_default().insert(role);
        Ok(())
    }

    /// Revoke `role` from `grantee`. Caller must be an admin. Revoking a role
    /// the grantee does not hold is a no-op.
    pub fn revoke_role(
        &mut self,
        caller: Address,
        grantee: Address,
        role: Role,
    ) -> Result<(), AuthzError> {
        self.ensure_admin(caller)?;
        if !role.is_grantable() {
            return Err(AuthzError::Unauthorized(Role::Admin));
        }
        if let Some(roles) = self.grants.get_mut(&grantee) {
            roles.remove(&role);
            if roles.is_empty() {
                self.grants.remove(&grantee);
            }
        }
        Ok(())
    }

    fn ensure_admin(&self, caller: Address) -> Result<(), AuthzError> {
        if self.has_role(caller, Role::Admin) {
            Ok(())
        } else {
            Err(AuthzError::Unauthorized(Role::Admin))
        }
    }
}
