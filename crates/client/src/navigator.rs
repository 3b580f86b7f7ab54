//! Navigation seam: where the user is, and where to send them.

use std::sync::Mutex;

use bazaar_core::normalize_path;

pub trait Navigator: Send + Sync {
    fn current_location(&self) -> String;

    fn navigate(&self, target: &str);

    /// Reload the current view.
    fn reload(&self);

    /// Navigate to `target` unless already there. Returns whether it navigated.
    ///
    /// Locations compare as normalized route paths.
    fn redirect_once(&self, target: &str) -> bool {
        if normalize_path(&self.current_location()) == normalize_path(target) {
            return false;
        }
        self.navigate(target);
        true
    }
}

#[derive(Debug, Default)]
struct NavState {
    location: String,
    history: Vec<String>,
    reloads: usize,
}

/// Records navigation; used by headless hosts and tests.
#[derive(Debug)]
pub struct InMemoryNavigator {
    state: Mutex<NavState>,
}

impl InMemoryNavigator {
    pub fn at(location: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(NavState {
                location: location.into(),
                ..NavState::default()
            }),
        }
    }

    /// Every target navigated to, in order.
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    pub fn reloads(&self) -> usize {
        self.lock().reloads
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NavState> {
        // A poisoned lock still holds consistent navigation state.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for InMemoryNavigator {
    fn default() -> Self {
        Self::at("/")
    }
}

impl Navigator for InMemoryNavigator {
    fn current_location(&self) -> String {
        self.lock().location.clone()
    }

    fn navigate(&self, target: &str) {
        let mut state = self.lock();
        state.location = target.to_string();
        state.history.push(target.to_string());
    }

    fn reload(&self) {
        self.lock().reloads += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_is_noop_when_already_there() {
        let nav = InMemoryNavigator::at("/login?next=/cart");
        assert!(!nav.redirect_once("/login"));
        assert!(nav.history().is_empty());

        assert!(nav.redirect_once("/admin/login"));
        assert!(!nav.redirect_once("/admin/login"));
        assert_eq!(nav.history(), vec!["/admin/login".to_string()]);
    }

    #[test]
    fn redirect_ignores_case_and_trailing_slash() {
        let nav = InMemoryNavigator::at("/Login/");
        assert!(!nav.redirect_once("/login"));

        let nav = InMemoryNavigator::at("https://shop.example.com/ADMIN/login#top");
        assert!(!nav.redirect_once("/admin/login"));
        assert!(nav.redirect_once("/login"));
        assert_eq!(nav.history(), vec!["/login".to_string()]);
    }

    #[test]
    fn counts_reloads() {
        let nav = InMemoryNavigator::default();
        nav.reload();
        nav.reload();
        assert_eq!(nav.reloads(), 2);
    }
}
