//! Shared application state handed to every reconciliation.

pub mod session;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};

use crate::{
    bank::QuestionBank, config::AppConfig, dao::session_store::SessionStore,
    transport::ChatTransport,
};

/// Cheaply cloneable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state: configuration, the question bank, the outbound
/// transport, the session store slot, and the per-guild reconciliation gates.
///
/// Shared client handles are carried here explicitly rather than as globals
/// so the whole reconciliation surface stays testable without a live network.
pub struct AppState {
    config: AppConfig,
    bank: QuestionBank,
    transport: Arc<dyn ChatTransport>,
    store: RwLock<Option<Arc<dyn SessionStore>>>,
    degraded: watch::Sender<bool>,
    guild_gates: DashMap<String, Arc<Mutex<()>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a store is installed.
    pub fn new(
        config: AppConfig,
        bank: QuestionBank,
        transport: Arc<dyn ChatTransport>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            bank,
            transport,
            store: RwLock::new(None),
            degraded: degraded_tx,
            guild_gates: DashMap::new(),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The question bank shared by every session.
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Outbound chat transport.
    pub fn transport(&self) -> &Arc<dyn ChatTransport> {
        &self.transport
    }

    /// Obtain a handle to the current session store, if one is installed.
    pub async fn session_store(&self) -> Option<Arc<dyn SessionStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a session store implementation and leave degraded mode.
    pub async fn install_session_store(&self, store: Arc<dyn SessionStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current session store and enter degraded mode.
    pub async fn clear_session_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Mutual-exclusion gate serializing all read-reconcile-persist sequences
    /// for one guild, created on first use. Timers and inbound messages for
    /// the same guild are totally ordered by this lock; unrelated guilds
    /// never contend.
    pub fn guild_gate(&self, guild_id: &str) -> Arc<Mutex<()>> {
        self.guild_gates
            .entry(guild_id.to_owned())
            .or_default()
            .clone()
    }

    /// Update and broadcast the degraded flag when the value changes.
    async fn update_degraded(&self, value: bool) {
        if *self.degraded.borrow() == value {
            return;
        }

        let _ = self.degraded.send(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dao::session_store::memory::MemorySessionStore, transport::console::ConsoleTransport};
    use std::time::Duration;

    fn state() -> SharedState {
        AppState::new(
            AppConfig::default(),
            QuestionBank::default(),
            Arc::new(ConsoleTransport::new()),
        )
    }

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = state();
        assert!(state.is_degraded().await);
        assert!(state.session_store().await.is_none());

        state
            .install_session_store(Arc::new(MemorySessionStore::new(Duration::from_secs(60))))
            .await;
        assert!(!state.is_degraded().await);
        assert!(state.session_store().await.is_some());

        state.clear_session_store().await;
        assert!(state.is_degraded().await);
    }

    #[tokio::test]
    async fn guild_gates_are_stable_per_guild() {
        let state = state();
        let first = state.guild_gate("guild-a");
        let again = state.guild_gate("guild-a");
        let other = state.guild_gate("guild-b");

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
    }
}
