use thiserror::Error;

use coinstake_core::Address;

use crate::{registry::RoleRegistry, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unauthorized: caller does not hold role '{0}'")]
    Unauthorized(Role),
}

/// Authorize a principal for an operation requiring `required`.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
///
/// Every mutating entry point consults this before touching any state or
/// calling out to the token service (fail-fast).
pub fn authorize(
    registry: &RoleRegistry,
    principal: Address,
    required: Role,
) -> Result<(), AuthzError> {
    if registry.has_role(principal, required) {
        Ok(())
    } else {
        Err(AuthzError::Unauthorized(required))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: u8) -> Address {
        Address::new([tag; 20])
    }

    #[test]
    fn admin_is_authorized_for_admin_only() {
        let registry = RoleRegistry::new(addr(1));

        assert!(authorize(&registry, addr(1), Role::Admin).is_ok());
        assert_eq!(
            authorize(&registry, addr(1), Role::Operator),
            Err(AuthzError::Unauthorized(Role::Operator))
        );
        assert_eq!(
            authorize(&registry, addr(2), Role::Admin),
            Err(AuthzError::Unauthorized(Role::Admin))
        );
    }

    #[test]
    fn granted_role_authorizes_and_revocation_removes_it() {
        let admin = addr(1);
        let op = addr(2);
        let mut registry = RoleRegistry::new(admin);

        registry.grant_role(admin, op, Role::Operator).unwrap();
        assert!(authorize(&registry, op, Role::Operator).is_ok());

        registry.revoke_role(admin, op, Role::Operator).unwrap();
        assert_eq!(
            authorize(&registry, op, Role::Operator),
            Err(AuthzError::Unauthorized(Role::Operator))
        );
    }
}
