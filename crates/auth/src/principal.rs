use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Role;

/// Identity of an authenticated principal (shopper, seller, admin).
///
/// Serialized as the bare UUID, which is what the `sub` claim carries.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// An authenticated identity with its granted roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(id: PrincipalId, roles: Vec<Role>) -> Self {
        Self { id, roles }
    }

    /// Any admin-family role grants admin.
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_if_any_role_is_admin() {
        let shopper = Principal::new(PrincipalId::new(), vec![Role::user()]);
        assert!(!shopper.is_admin());

        let staff = Principal::new(PrincipalId::new(), vec![Role::user(), Role::new("super_admin")]);
        assert!(staff.is_admin());
    }

    #[test]
    fn id_serializes_as_bare_uuid() {
        let id = PrincipalId::new();
        let v = serde_json::to_value(id).unwrap();
        assert_eq!(v, serde_json::Value::String(id.to_string()));
    }
}
