//! services/api/src/web/state.rs
//!
//! Defines the application's shared state: the three persisted stores behind
//! a single mutex, the port implementations, and the in-flight send guard.
//!
//! The whole application is one logical thread of UI events, so one lock is
//! enough; holding it across the generation await is what suspends the
//! interaction while a reply is pending.

use chrono::{DateTime, Utc};
use nyaya_core::domain::{AppSettings, UserState};
use nyaya_core::ports::{ConversationService, DocumentDraftingService, PortResult, StateStore};
use nyaya_core::session::SessionLog;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

//=========================================================================================
// Stores (The Three Persisted Records)
//=========================================================================================

/// The in-memory working copies of the persisted records. Every mutation is
/// followed by a wholesale save of the touched record through the
/// `StateStore` port.
pub struct Stores {
    pub user: UserState,
    pub settings: AppSettings,
    pub sessions: SessionLog,
}

impl Stores {
    /// Loads the three records, falling back to first-run defaults for any
    /// that are absent or unparseable. Also applies the daily quota rollover
    /// once at startup; subsequent rollovers happen on each quota check.
    pub async fn load(db: &dyn StateStore, now: DateTime<Utc>) -> PortResult<Self> {
        let mut user = db
            .load_user_state()
            .await?
            .unwrap_or_else(|| UserState::new(now));
        user.apply_daily_rollover(now);

        let settings = db.load_settings().await?.unwrap_or_default();

        let sessions = match db.load_sessions().await? {
            Some(persisted) => SessionLog::from_sessions(persisted, now),
            None => SessionLog::new(now),
        };

        Ok(Self {
            user,
            settings,
            sessions,
        })
    }
}

//=========================================================================================
// AppState (Shared Across All Handlers)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub stores: Mutex<Stores>,
    pub db: Arc<dyn StateStore>,
    pub chat: Arc<dyn ConversationService>,
    pub docs: Arc<dyn DocumentDraftingService>,
    sending: AtomicBool,
}

impl AppState {
    pub fn new(
        stores: Stores,
        db: Arc<dyn StateStore>,
        chat: Arc<dyn ConversationService>,
        docs: Arc<dyn DocumentDraftingService>,
    ) -> Self {
        Self {
            stores: Mutex::new(stores),
            db,
            chat,
            docs,
            sending: AtomicBool::new(false),
        }
    }

    /// Claims the single in-flight send slot. Returns `None` while another
    /// send is pending: a second send is rejected, not queued. The slot is
    /// released when the returned guard drops.
    pub fn try_begin_send(&self) -> Option<SendGuard<'_>> {
        self.sending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then(|| SendGuard(&self.sending))
    }
}

/// RAII release for the in-flight send slot.
pub struct SendGuard<'a>(&'a AtomicBool);

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
