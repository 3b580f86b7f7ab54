use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role names that count as administrative everywhere in the platform.
pub const ADMIN_ROLE_NAMES: &[&str] = &["admin", "super_admin", "superadmin"];

/// Role identifier.
///
/// Roles are opaque strings at this layer; the only built-in interpretation is
/// whether a role is administrative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn admin() -> Self {
        Self(Cow::Borrowed("admin"))
    }

    pub fn user() -> Self {
        Self(Cow::Borrowed("user"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        is_admin_role(self.as_str())
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Case-insensitive check against [`ADMIN_ROLE_NAMES`].
pub fn is_admin_role(name: &str) -> bool {
    let name = name.trim();
    ADMIN_ROLE_NAMES.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_roles() {
        assert!(Role::admin().is_admin());
        assert!(Role::new("Super_Admin").is_admin());
        assert!(!Role::user().is_admin());
        assert!(!Role::new("administrator-candidate").is_admin());
    }

    #[test]
    fn serializes_as_plain_string() {
        let v = serde_json::to_value(Role::new("seller")).unwrap();
        assert_eq!(v, serde_json::json!("seller"));
    }
}
