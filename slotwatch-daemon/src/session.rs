//! Shared credential bundle with single-flight reauthentication.
//!
//! Both loops read the bundle at fetch time and may ask for a refresh when
//! the resource rejects it. Refreshes are serialized behind one async mutex,
//! and every bundle carries a generation number: a caller that observed
//! generation `g` and finds the current generation already past `g` once it
//! holds the mutex reuses the newer bundle instead of logging in again.

use std::sync::Arc;

use slotwatch_core::{AuthError, CredentialBundle, Reauthenticator};
use slotwatch_store::CredentialStore;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

/// A bundle together with the generation it belongs to.
#[derive(Debug, Clone)]
pub struct SessionTicket {
    /// Credentials to send with the request.
    pub bundle: Arc<CredentialBundle>,
    /// Generation the bundle was installed at.
    pub generation: u64,
}

/// How a refresh request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// This caller ran the login flow and installed a new bundle.
    Refreshed,
    /// Another caller refreshed first; its bundle is now current.
    Reused,
}

#[derive(Debug)]
struct Current {
    bundle: Arc<CredentialBundle>,
    generation: u64,
}

/// Guarded access to the credential bundle shared by both loops.
pub struct SessionManager {
    current: RwLock<Current>,
    refresh_lock: Mutex<()>,
    gate: Arc<dyn Reauthenticator>,
    store: Option<CredentialStore>,
}

impl SessionManager {
    /// Creates a manager with an empty bundle.
    ///
    /// Refreshed bundles are written to `store` when one is given.
    pub fn new(gate: Arc<dyn Reauthenticator>, store: Option<CredentialStore>) -> Self {
        Self {
            current: RwLock::new(Current {
                bundle: Arc::new(CredentialBundle::empty()),
                generation: 0,
            }),
            refresh_lock: Mutex::new(()),
            gate,
            store,
        }
    }

    /// Creates a manager and seeds it from the credential store.
    pub async fn load(gate: Arc<dyn Reauthenticator>, store: CredentialStore) -> Self {
        let stored = store.load().await;
        let manager = Self::new(gate, Some(store));
        if let Some(bundle) = stored {
            info!(cookies = bundle.len(), "Using stored session");
            manager.install(bundle).await;
        }
        manager
    }

    /// Replaces the bundle without running the login flow.
    pub async fn install(&self, bundle: CredentialBundle) {
        let mut current = self.current.write().await;
        current.bundle = Arc::new(bundle);
        current.generation += 1;
    }

    /// The bundle to use for the next request.
    pub async fn ticket(&self) -> SessionTicket {
        let current = self.current.read().await;
        SessionTicket {
            bundle: Arc::clone(&current.bundle),
            generation: current.generation,
        }
    }

    /// Returns true if no session has been obtained yet.
    pub async fn is_empty(&self) -> bool {
        self.current.read().await.bundle.is_empty()
    }

    /// Replaces the bundle observed at `stale_generation`.
    ///
    /// At most one login flow runs at a time. On failure the stale bundle
    /// stays in place.
    #[instrument(skip(self))]
    pub async fn refresh(&self, stale_generation: u64) -> Result<RefreshOutcome, AuthError> {
        let _guard = self.refresh_lock.lock().await;

        if self.current.read().await.generation != stale_generation {
            info!("Session already refreshed by another task");
            return Ok(RefreshOutcome::Reused);
        }

        let bundle = self.gate.reauthenticate().await?;

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&bundle).await {
                warn!(error = %e, "Failed to persist refreshed session");
            }
        }

        self.install(bundle).await;
        info!("Session refreshed");
        Ok(RefreshOutcome::Refreshed)
    }

    /// Runs the login flow once if no session is loaded.
    ///
    /// Failure is logged; the loops retry on their own schedule.
    pub async fn ensure_initial(&self) {
        if !self.is_empty().await {
            return;
        }

        info!("No session available, logging in");
        let generation = self.ticket().await.generation;
        if let Err(e) = self.refresh(generation).await {
            warn!(error = %e, "Initial login failed");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use slotwatch_core::SessionCookie;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    struct CountingGate {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingGate {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl Reauthenticator for CountingGate {
        async fn reauthenticate(&self) -> Result<CredentialBundle, AuthError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
            if self.fail {
                return Err(AuthError::LoginFailed("bad password".to_string()));
            }
            Ok(CredentialBundle::new(vec![SessionCookie::new(
                "sid",
                format!("login-{n}"),
            )]))
        }
    }

    #[tokio::test]
    async fn test_refresh_installs_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::in_dir(dir.path());
        let gate = CountingGate::new(false);
        let manager = SessionManager::new(gate.clone(), Some(store.clone()));

        let before = manager.ticket().await;
        assert!(before.bundle.is_empty());

        let outcome = manager.refresh(before.generation).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Refreshed);

        let after = manager.ticket().await;
        assert_eq!(after.generation, before.generation + 1);
        assert_eq!(after.bundle.cookie_header().as_deref(), Some("sid=login-1"));

        let stored = store.load().await.unwrap();
        assert_eq!(stored.cookie_header().as_deref(), Some("sid=login-1"));
    }

    #[tokio::test]
    async fn test_concurrent_refresh_runs_login_once() {
        let gate = CountingGate::new(false);
        let manager = Arc::new(SessionManager::new(gate.clone(), None));
        let stale = manager.ticket().await.generation;

        let a = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.refresh(stale).await }
        });
        let b = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.refresh(stale).await }
        });

        let mut outcomes = vec![a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];
        outcomes.sort_by_key(|o| *o == RefreshOutcome::Reused);

        assert_eq!(outcomes, [RefreshOutcome::Refreshed, RefreshOutcome::Reused]);
        assert_eq!(gate.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_bundle() {
        let gate = CountingGate::new(true);
        let manager = SessionManager::new(gate.clone(), None);
        manager
            .install(CredentialBundle::new(vec![SessionCookie::new("sid", "old")]))
            .await;
        let before = manager.ticket().await;

        let err = manager.refresh(before.generation).await.unwrap_err();
        assert!(matches!(err, AuthError::LoginFailed(_)));

        let after = manager.ticket().await;
        assert_eq!(after.generation, before.generation);
        assert_eq!(after.bundle.cookie_header().as_deref(), Some("sid=old"));
    }

    #[tokio::test]
    async fn test_load_seeds_from_store_and_skips_initial_login() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::in_dir(dir.path());
        store
            .save(&CredentialBundle::new(vec![SessionCookie::new("sid", "saved")]))
            .await
            .unwrap();

        let gate = CountingGate::new(false);
        let manager = SessionManager::load(gate.clone(), store).await;
        manager.ensure_initial().await;

        assert_eq!(gate.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            manager.ticket().await.bundle.cookie_header().as_deref(),
            Some("sid=saved")
        );
    }

    #[tokio::test]
    async fn test_ensure_initial_logs_in_when_empty() {
        let dir = TempDir::new().unwrap();
        let gate = CountingGate::new(false);
        let manager = SessionManager::load(gate.clone(), CredentialStore::in_dir(dir.path())).await;

        manager.ensure_initial().await;

        assert_eq!(gate.calls.load(Ordering::SeqCst), 1);
        assert!(!manager.is_empty().await);
    }

    #[tokio::test]
    async fn test_ensure_initial_failure_is_not_fatal() {
        let gate = CountingGate::new(true);
        let manager = SessionManager::new(gate.clone(), None);

        manager.ensure_initial().await;

        assert_eq!(gate.calls.load(Ordering::SeqCst), 1);
        assert!(manager.is_empty().await);
    }
}
