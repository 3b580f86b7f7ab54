//! Credential store.
//!
//! The whole slot set lives in one value behind a `watch` channel, so every
//! multi-slot write is a single atomic update and subscribers see each
//! committed state.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use bazaar_auth::roles::is_admin_role;

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("failed to persist session: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Locally cached identity (for UI decisions only, never for authorization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPrincipal {
    pub id: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl CachedPrincipal {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| is_admin_role(r))
    }
}

/// The named credential slots plus the cached principals purged with them.
///
/// Field names on the wire are the persisted client keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSlots {
    #[serde(rename = "accessToken", default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    /// Legacy alias still read by older screens; always equal to `access`.
    #[serde(rename = "token", default, skip_serializing_if = "Option::is_none")]
    pub legacy_access: Option<String>,
    #[serde(rename = "adminAccessToken", default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<String>,
    #[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
    #[serde(rename = "user", default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<CachedPrincipal>,
    #[serde(rename = "adminUser", default, skip_serializing_if = "Option::is_none")]
    pub admin_principal: Option<CachedPrincipal>,
}

impl CredentialSlots {
    /// Write the access token into both the access slot and its legacy alias.
    pub fn set_access(&mut self, token: impl Into<String>) {
        let token = token.into();
        self.legacy_access = Some(token.clone());
        self.access = Some(token);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether any token or principal is present.
    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
            || self.admin_principal.is_some()
            || [&self.access, &self.legacy_access, &self.admin]
                .iter()
                .any(|slot| slot.as_deref().is_some_and(|t| !t.is_empty()))
    }

    /// Whether a locally cached principal carries an admin role.
    pub fn has_admin_principal(&self) -> bool {
        self.principal.as_ref().is_some_and(CachedPrincipal::is_admin)
            || self.admin_principal.as_ref().is_some_and(CachedPrincipal::is_admin)
    }
}

/// Tokens handed over by a login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTokens {
    pub access: String,
    pub refresh: Option<String>,
    pub principal: CachedPrincipal,
    /// Login happened through the admin entry point.
    pub admin: bool,
}

/// Shared, injectable credential namespace.
pub trait SessionStore: Send + Sync {
    /// Current committed slot set.
    fn snapshot(&self) -> CredentialSlots;

    /// Atomic read-modify-write. `f` returns whether it changed anything;
    /// the result is that same flag.
    fn update(
        &self,
        f: &mut dyn FnMut(&mut CredentialSlots) -> bool,
    ) -> Result<bool, SessionStoreError>;

    /// Change notification: the receiver sees every committed slot set.
    fn subscribe(&self) -> watch::Receiver<CredentialSlots>;

    fn replace(&self, slots: CredentialSlots) -> Result<(), SessionStoreError> {
        let mut next = Some(slots);
        self.update(&mut |current| {
            if let Some(next) = next.take() {
                *current = next;
            }
            true
        })?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        self.replace(CredentialSlots::default())
    }

    /// Store the result of a successful login.
    fn establish(&self, login: LoginTokens) -> Result<(), SessionStoreError> {
        let mut slots = self.snapshot();
        slots.set_access(login.access.clone());
        slots.refresh = login.refresh;
        if login.admin {
            slots.admin = Some(login.access);
            slots.admin_principal = Some(login.principal);
        } else {
            slots.principal = Some(login.principal);
        }
        self.replace(slots)
    }
}

/// Process-local store.
#[derive(Debug)]
pub struct InMemorySessionStore {
    tx: watch::Sender<CredentialSlots>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::with_slots(CredentialSlots::default())
    }

    pub fn with_slots(slots: CredentialSlots) -> Self {
        let (tx, _rx) = watch::channel(slots);
        Self { tx }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn snapshot(&self) -> CredentialSlots {
        self.tx.borrow().clone()
    }

    fn update(
        &self,
        f: &mut dyn FnMut(&mut CredentialSlots) -> bool,
    ) -> Result<bool, SessionStoreError> {
        Ok(self.tx.send_if_modified(|slots| f(slots)))
    }

    fn subscribe(&self) -> watch::Receiver<CredentialSlots> {
        self.tx.subscribe()
    }
}

/// Store persisted as JSON so a session survives restarts.
///
/// A change is committed in memory only after it reached disk.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    inner: InMemorySessionStore,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Open (or start) the session file inside `dir`.
    ///
    /// An unreadable or corrupt file starts an empty session.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(SESSION_FILE);
        let slots = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), "discarding corrupt session file: {e}");
                CredentialSlots::default()
            }),
            Err(_) => CredentialSlots::default(),
        };

        Self {
            path,
            inner: InMemorySessionStore::with_slots(slots),
            write_lock: Mutex::new(()),
        }
    }

    /// Open in the platform data directory (`<data_dir>/bazaar`).
    pub fn open_default() -> Option<Self> {
        dirs::data_dir().map(|d| Self::open(d.join("bazaar")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, slots: &CredentialSlots) -> Result<(), SessionStoreError> {
        if slots.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(slots)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn snapshot(&self) -> CredentialSlots {
        self.inner.snapshot()
    }

    fn update(
        &self,
        f: &mut dyn FnMut(&mut CredentialSlots) -> bool,
    ) -> Result<bool, SessionStoreError> {
        // Poisoning only means another writer panicked; the guard holds no data.
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = self.inner.snapshot();
        if !f(&mut next) {
            return Ok(false);
        }
        self.persist(&next)?;
        self.inner.tx.send_replace(next);
        Ok(true)
    }

    fn subscribe(&self) -> watch::Receiver<CredentialSlots> {
        self.inner.subscribe()
    }
}
