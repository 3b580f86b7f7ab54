//! Storage for the availability singleton.
//!
//! The document is created lazily: the first `load_or_create` persists the
//! defaults, every later call returns what is stored.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use bazaar_core::SiteSettings;

#[derive(Debug, Error)]
pub enum SettingsStoreError {
    #[error("settings storage unavailable: {0}")]
    Unavailable(String),

    #[error("settings document is corrupt: {0}")]
    Corrupt(String),

    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Singleton settings document store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Return the stored document, creating it from defaults on first access.
    async fn load_or_create(&self) -> Result<SiteSettings, SettingsStoreError>;

    /// Replace the stored document.
    async fn save(&self, settings: SiteSettings) -> Result<(), SettingsStoreError>;
}

#[async_trait]
impl<S> SettingsStore for Arc<S>
where
    S: SettingsStore + ?Sized,
{
    async fn load_or_create(&self) -> Result<SiteSettings, SettingsStoreError> {
        (**self).load_or_create().await
    }

    async fn save(&self, settings: SiteSettings) -> Result<(), SettingsStoreError> {
        (**self).save(settings).await
    }
}

/// In-memory store for tests/dev.
#[derive(Debug)]
pub struct InMemorySettingsStore {
    defaults: SiteSettings,
    inner: RwLock<Option<SiteSettings>>,
}

impl InMemorySettingsStore {
    pub fn new(defaults: SiteSettings) -> Self {
        Self {
            defaults,
            inner: RwLock::new(None),
        }
    }

    /// Whether the singleton has been materialised yet.
    pub fn is_created(&self) -> bool {
        self.inner.read().map(|g| g.is_some()).unwrap_or(false)
    }
}

impl Default for InMemorySettingsStore {
    fn default() -> Self {
        Self::new(SiteSettings::default())
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn load_or_create(&self) -> Result<SiteSettings, SettingsStoreError> {
        if let Some(existing) = self
            .inner
            .read()
            .map_err(|_| SettingsStoreError::Unavailable("lock poisoned".to_string()))?
            .as_ref()
        {
            return Ok(existing.clone());
        }

        let mut guard = self
            .inner
            .write()
            .map_err(|_| SettingsStoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(guard.get_or_insert_with(|| self.defaults.clone()).clone())
    }

    async fn save(&self, settings: SiteSettings) -> Result<(), SettingsStoreError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| SettingsStoreError::Unavailable("lock poisoned".to_string()))?;
        *guard = Some(settings);
        Ok(())
    }
}

/// JSON-file-backed store (single-node deployments).
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    defaults: SiteSettings,
    // Serialises get-or-create so two first readers don't both write defaults.
    write_lock: tokio::sync::Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>, defaults: SiteSettings) -> Self {
        Self {
            path: path.into(),
            defaults,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn read(&self) -> Result<Option<SiteSettings>, SettingsStoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents)
                .map(Some)
                .map_err(|e| SettingsStoreError::Corrupt(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, settings: &SiteSettings) -> Result<(), SettingsStoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(settings)
            .map_err(|e| SettingsStoreError::Corrupt(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load_or_create(&self) -> Result<SiteSettings, SettingsStoreError> {
        if let Some(existing) = self.read().await? {
            return Ok(existing);
        }

        let _guard = self.write_lock.lock().await;
        if let Some(existing) = self.read().await? {
            return Ok(existing);
        }
        tracing::info!(path = %self.path.display(), "creating site settings document");
        self.write(&self.defaults).await?;
        Ok(self.defaults.clone())
    }

    async fn save(&self, settings: SiteSettings) -> Result<(), SettingsStoreError> {
        let _guard = self.write_lock.lock().await;
        self.write(&settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn in_memory_get_or_create() {
        let store = InMemorySettingsStore::new(SiteSettings::new("Shop", "Desc"));
        assert!(!store.is_created());

        let first = store.load_or_create().await.unwrap();
        assert!(store.is_created());
        assert_eq!(first.site_name, "Shop");
        assert!(!first.maintenance_mode);

        let mut updated = first.clone();
        updated.set_maintenance(true, None, Utc::now());
        store.save(updated).await.unwrap();

        assert!(store.load_or_create().await.unwrap().maintenance_mode);
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let dir = std::env::temp_dir().join(format!("bazaar-settings-{}", uuid_like()));
        let path = dir.join("settings.json");

        let store = FileSettingsStore::new(&path, SiteSettings::default());
        let mut s = store.load_or_create().await.unwrap();
        assert!(path.exists());

        s.set_maintenance(true, Some("Upgrading".to_string()), Utc::now());
        store.save(s).await.unwrap();

        let reopened = FileSettingsStore::new(&path, SiteSettings::default());
        let loaded = reopened.load_or_create().await.unwrap();
        assert!(loaded.maintenance_mode);
        assert_eq!(loaded.message(), "Upgrading");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn file_store_reports_corruption() {
        let dir = std::env::temp_dir().join(format!("bazaar-settings-{}", uuid_like()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileSettingsStore::new(&path, SiteSettings::default());
        assert!(matches!(
            store.load_or_create().await,
            Err(SettingsStoreError::Corrupt(_))
        ));

        let _ = std::fs::remove_dir_all(dir);
    }

    fn uuid_like() -> String {
        format!(
            "{}-{}",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        )
    }
}
