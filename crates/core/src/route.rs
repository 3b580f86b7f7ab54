//! Declarative route classification.
//!
//! One table drives three decisions that must never drift apart:
//! - which credential the client attaches (Admin vs General),
//! - which requests the server-side availability gate lets through,
//! - when the client poller can skip the status probe.
//!
//! Matching is plain string matching over a normalized path, so admission is
//! monotonic: anything equal to, starting with, containing or ending with an
//! admin marker is Admin-Class.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Derived category of a request's destination.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteClass {
    Admin,
    General,
}

impl RouteClass {
    pub fn is_admin(&self) -> bool {
        matches!(self, RouteClass::Admin)
    }
}

/// A single path-matching rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "match", content = "pattern", rename_all = "snake_case")]
pub enum MatchRule {
    Exact(Cow<'static, str>),
    Prefix(Cow<'static, str>),
    Contains(Cow<'static, str>),
    Suffix(Cow<'static, str>),
}

impl MatchRule {
    pub const fn exact(p: &'static str) -> Self {
        Self::Exact(Cow::Borrowed(p))
    }

    pub const fn prefix(p: &'static str) -> Self {
        Self::Prefix(Cow::Borrowed(p))
    }

    pub const fn contains(p: &'static str) -> Self {
        Self::Contains(Cow::Borrowed(p))
    }

    pub const fn suffix(p: &'static str) -> Self {
        Self::Suffix(Cow::Borrowed(p))
    }

    /// Match against an already-normalized path.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            MatchRule::Exact(p) => path == p.as_ref(),
            MatchRule::Prefix(p) => path.starts_with(p.as_ref()),
            MatchRule::Contains(p) => path.contains(p.as_ref()),
            MatchRule::Suffix(p) => path.ends_with(p.as_ref()),
        }
    }

    /// Parse `kind:pattern`, e.g. `prefix:/api/admin`.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let (kind, pattern) = s
            .split_once(':')
            .ok_or_else(|| CoreError::invalid_route_rule(format!("missing ':' in '{s}'")))?;
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(CoreError::invalid_route_rule(format!("empty pattern in '{s}'")));
        }
        let pattern = Cow::Owned(normalize_path(pattern));
        match kind.trim().to_ascii_lowercase().as_str() {
            "exact" | "eq" => Ok(MatchRule::Exact(pattern)),
            "prefix" => Ok(MatchRule::Prefix(pattern)),
            "contains" => Ok(MatchRule::Contains(pattern)),
            "suffix" => Ok(MatchRule::Suffix(pattern)),
            other => Err(CoreError::invalid_route_rule(format!("unknown rule kind '{other}'"))),
        }
    }
}

/// Admin marker rules.
pub const ADMIN_RULES: &[MatchRule] = &[
    MatchRule::exact("/admin"),
    MatchRule::prefix("/admin"),
    MatchRule::prefix("/api/admin"),
    MatchRule::contains("/admin/"),
    MatchRule::suffix("/admin"),
];

/// Public configuration/status namespace (reachable during maintenance).
pub const PUBLIC_RULES: &[MatchRule] = &[
    MatchRule::exact("/health"),
    MatchRule::prefix("/settings"),
    MatchRule::prefix("/api/settings"),
];

/// Background/polling routes whose failures never raise a user notice.
pub const BACKGROUND_RULES: &[MatchRule] = &[
    MatchRule::exact("/health"),
    MatchRule::suffix("/settings/maintenance-status"),
    MatchRule::suffix("/unread-count"),
    MatchRule::prefix("/notifications/poll"),
    MatchRule::prefix("/api/notifications/poll"),
];

/// The shared classification table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    admin: Vec<MatchRule>,
    public: Vec<MatchRule>,
    background: Vec<MatchRule>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RouteTable {
    pub fn new(admin: Vec<MatchRule>, public: Vec<MatchRule>, background: Vec<MatchRule>) -> Self {
        Self {
            admin,
            public,
            background,
        }
    }

    /// The table every deployment ships with.
    pub fn standard() -> Self {
        Self::new(
            ADMIN_RULES.to_vec(),
            PUBLIC_RULES.to_vec(),
            BACKGROUND_RULES.to_vec(),
        )
    }

    /// Extend the admin rules (e.g. from configuration).
    pub fn with_admin_rule(mut self, rule: MatchRule) -> Self {
        self.admin.push(rule);
        self
    }

    /// Classify a single raw path (query/fragment/host are stripped first).
    pub fn classify(&self, raw: &str) -> RouteClass {
        let path = normalize_path(raw);
        if self.admin.iter().any(|r| r.matches(&path)) {
            RouteClass::Admin
        } else {
            RouteClass::General
        }
    }

    /// Admin if ANY of the given path representations classifies as Admin.
    ///
    /// Upstream routers may already have stripped a mount prefix, so callers
    /// pass every representation they have (original URI, nested path, ...).
    pub fn classify_any<'a, I>(&self, representations: I) -> RouteClass
    where
        I: IntoIterator<Item = &'a str>,
    {
        if representations
            .into_iter()
            .any(|p| self.classify(p).is_admin())
        {
            RouteClass::Admin
        } else {
            RouteClass::General
        }
    }

    pub fn is_public(&self, raw: &str) -> bool {
        let path = normalize_path(raw);
        self.public.iter().any(|r| r.matches(&path))
    }

    pub fn is_background(&self, raw: &str) -> bool {
        let path = normalize_path(raw);
        self.background.iter().any(|r| r.matches(&path))
    }
}

/// Canonical form used for matching.
///
/// - drops scheme/host from absolute URLs
/// - drops query string and fragment
/// - lowercases
/// - collapses repeated slashes, guarantees a leading slash
/// - drops a trailing slash (except for the root)
pub fn normalize_path(raw: &str) -> String {
    let mut s = raw.trim();

    if let Some(idx) = s.find("://") {
        let after = &s[idx + 3..];
        s = match after.find('/') {
            Some(slash) => &after[slash..],
            None => "/",
        };
    }

    let end = s.find(['?', '#']).unwrap_or(s.len());
    let s = &s[..end];

    let mut out = String::with_capacity(s.len() + 1);
    out.push('/');
    for segment in s.split('/').filter(|seg| !seg.is_empty()) {
        if out.len() > 1 {
            out.push('/');
        }
        out.push_str(&segment.to_ascii_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_strips_query_host_and_slashes() {
        assert_eq!(normalize_path("/api/admin/users?page=2"), "/api/admin/users");
        assert_eq!(normalize_path("https://shop.example.com/Admin//Users/#x"), "/admin/users");
        assert_eq!(normalize_path("products/"), "/products");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("http://host"), "/");
    }

    #[test]
    fn classifies_admin_variants() {
        let table = RouteTable::standard();
        for path in [
            "/admin",
            "/admin/",
            "/admin/login",
            "/api/admin/users",
            "/v2/admin/orders",
            "/store/admin",
            "/API/ADMIN/settings?x=1",
        ] {
            assert_eq!(table.classify(path), RouteClass::Admin, "{path}");
        }
    }

    #[test]
    fn classifies_general_paths() {
        let table = RouteTable::standard();
        for path in ["/", "/products", "/feed/posts", "/settings/maintenance-status", "/user/admins-list"] {
            assert_eq!(table.classify(path), RouteClass::General, "{path}");
        }
        // Plain prefix match, not segment-aware.
        assert_eq!(table.classify("/administration-fees"), RouteClass::Admin);
    }

    #[test]
    fn any_representation_wins() {
        let table = RouteTable::standard();
        // Router stripped the `/api/admin` mount: inner path alone is general.
        assert_eq!(table.classify("/users"), RouteClass::General);
        assert_eq!(table.classify_any(["/users", "/api/admin/users"]), RouteClass::Admin);
        assert_eq!(table.classify_any(["/users", "/products"]), RouteClass::General);
    }

    #[test]
    fn public_and_background_namespaces() {
        let table = RouteTable::standard();
        assert!(table.is_public("/settings/maintenance-status"));
        assert!(table.is_public("/api/settings"));
        assert!(table.is_public("/health"));
        assert!(!table.is_public("/products"));

        assert!(table.is_background("/settings/maintenance-status?t=1"));
        assert!(table.is_background("/api/chat/unread-count"));
        assert!(!table.is_background("/checkout"));
    }

    #[test]
    fn parse_rules() {
        assert_eq!(
            MatchRule::parse("prefix:/API/Staff").unwrap(),
            MatchRule::Prefix(Cow::Owned("/api/staff".to_string()))
        );
        assert!(MatchRule::parse("prefix").is_err());
        assert!(MatchRule::parse("regex:/x").is_err());
        assert!(MatchRule::parse("exact:").is_err());

        let table = RouteTable::standard().with_admin_rule(MatchRule::parse("prefix:/staff").unwrap());
        assert_eq!(table.classify("/staff/queue"), RouteClass::Admin);
    }

    proptest! {
        #[test]
        fn admin_marker_anywhere_is_admin(
            before in "(/[a-z0-9-]{1,8}){0,3}",
            after in "(/[a-z0-9-]{1,8}){0,3}",
            query in "(\\?[a-z]=[0-9]{1,3})?",
        ) {
            let table = RouteTable::standard();
            let path = format!("{before}/admin{after}{query}");
            prop_assert_eq!(table.classify(&path), RouteClass::Admin);
        }

        #[test]
        fn normalize_is_idempotent(raw in "[a-zA-Z0-9/?#=&._-]{0,40}") {
            let once = normalize_path(&raw);
            prop_assert_eq!(normalize_path(&once), once.clone());
            prop_assert!(once.starts_with('/'));
        }
    }
}
