//! Per-instance session-token cache.
//!
//! The panel authenticates per instance and tokens expire server-side
//! without notice. The store caches tokens between calls; the engine's
//! healing path calls [`SessionStore::invalidate`] to force a re-login on
//! next use.

use std::collections::HashMap;

use tokio::sync::Mutex;

/// Cached session tokens keyed by instance name. The controller scope
/// (instance listing) is cached under [`SessionStore::CONTROLLER`].
#[derive(Debug, Default)]
pub struct SessionStore {
    tokens: Mutex<HashMap<String, String>>,
}

impl SessionStore {
    /// Pseudo-instance key for the controller-level session.
    pub const CONTROLLER: &'static str = "";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, instance: &str) -> Option<String> {
        self.tokens.lock().await.get(instance).cloned()
    }

    pub async fn set(&self, instance: &str, token: String) {
        self.tokens.lock().await.insert(instance.to_owned(), token);
    }

    /// Drop a cached token. Returns `true` if one was present.
    pub async fn invalidate(&self, instance: &str) -> bool {
        self.tokens.lock().await.remove(instance).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn caches_and_invalidates() {
        let store = SessionStore::new();
        assert_eq!(store.get("smp").await, None);

        store.set("smp", "tok-1".to_owned()).await;
        assert_eq!(store.get("smp").await.as_deref(), Some("tok-1"));

        assert!(store.invalidate("smp").await);
        assert_eq!(store.get("smp").await, None);
        assert!(!store.invalidate("smp").await);
    }

    #[tokio::test]
    async fn controller_scope_is_separate() {
        let store = SessionStore::new();
        store
            .set(SessionStore::CONTROLLER, "ctl".to_owned())
            .await;
        store.set("smp", "tok".to_owned()).await;
        assert_eq!(
            store.get(SessionStore::CONTROLLER).await.as_deref(),
            Some("ctl")
        );
        store.invalidate("smp").await;
        assert_eq!(
            store.get(SessionStore::CONTROLLER).await.as_deref(),
            Some("ctl")
        );
    }
}
