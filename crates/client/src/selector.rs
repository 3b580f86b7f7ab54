//! Token selection per route class.

use bazaar_core::{RouteClass, RunMode, is_placeholder, is_real};

use crate::session::CredentialSlots;

/// What the decorator should do with the Authorization header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSelection {
    Attach(String),
    /// Only a placeholder is available but a real refresh credential exists:
    /// refresh before sending.
    NeedsRefresh,
    None,
}

impl TokenSelection {
    pub fn token(&self) -> Option<&str> {
        match self {
            TokenSelection::Attach(t) => Some(t),
            _ => None,
        }
    }
}

fn preference(slots: &CredentialSlots, class: RouteClass) -> [Option<&str>; 3] {
    let access = slots.access.as_deref();
    let legacy = slots.legacy_access.as_deref();
    let admin = slots.admin.as_deref();
    match class {
        RouteClass::Admin => [admin, access, legacy],
        RouteClass::General => [access, legacy, admin],
    }
}

/// Pick the bearer token for a request to a route of class `class`.
///
/// First non-empty slot in preference order wins. Read-only.
pub fn select_token(slots: &CredentialSlots, class: RouteClass, mode: RunMode) -> TokenSelection {
    let Some(token) = preference(slots, class)
        .into_iter()
        .flatten()
        .find(|t| !t.trim().is_empty())
    else {
        return TokenSelection::None;
    };

    if mode.allows_placeholders() || !is_placeholder(token) {
        return TokenSelection::Attach(token.to_string());
    }

    if is_real(slots.refresh.as_deref()) {
        TokenSelection::NeedsRefresh
    } else {
        TokenSelection::None
    }
}
