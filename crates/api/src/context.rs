use bazaar_auth::{Principal, PrincipalId, Role};

/// Who is calling, as established from the bearer token.
///
/// Present in request extensions only when the token validated; the gate
/// treats its absence as anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        Self { principal_id, roles }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }
}

impl From<Principal> for PrincipalContext {
    fn from(value: Principal) -> Self {
        Self::new(value.id, value.roles)
    }
}
