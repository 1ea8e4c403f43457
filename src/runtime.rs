//! Runtime for executing conversations
//!
//! One `ConversationRuntime` task per session processes events strictly in
//! order. The `SessionManager` owns the handles used by the HTTP layer.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;
pub use traits::*;

use crate::config::{Config, ServiceStatus};
use crate::state_machine::{transition, ConvContext, ConvState, Event, TransitionError};
use crate::store::{Message, MessageId, SessionView};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch, RwLock};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init { view: SessionView },
    Message { message: Message },
    /// A transient message was removed
    Retract { id: MessageId },
    Typing { is_typing: bool },
    StateChange { state: ConvState },
    Error { message: String },
}

/// Latest committed state of a session, published after every step
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub view: SessionView,
    pub state: ConvState,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Session not found")]
    NotFound,
    #[error("Assistant is busy, wait for the current request to finish")]
    Busy,
    #[error(transparent)]
    Rejected(TransitionError),
    #[error("Session runtime has stopped")]
    Closed,
}

impl From<TransitionError> for SubmitError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::Busy => SubmitError::Busy,
            other => SubmitError::Rejected(other),
        }
    }
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub context: ConvContext,
    pub event_tx: mpsc::Sender<Event>,
    pub broadcast_tx: broadcast::Sender<SseEvent>,
    pub snapshot_rx: watch::Receiver<Snapshot>,
    /// Set while a user event is queued or being processed
    busy: Arc<AtomicBool>,
    /// Milliseconds since the manager epoch
    last_active: Arc<AtomicU64>,
}

impl SessionHandle {
    pub fn view(&self) -> SessionView {
        self.snapshot_rx.borrow().view.clone()
    }

    /// Claim the session for one user event
    fn try_begin(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Manager for all session runtimes
pub struct SessionManager {
    providers: Providers,
    /// Read at session creation; open sessions keep the status they started with
    online: AtomicBool,
    contact_url: String,
    idle_ttl: Duration,
    epoch: Instant,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(providers: Providers, config: &Config) -> Self {
        Self {
            providers,
            online: AtomicBool::new(config.status.is_online()),
            contact_url: config.contact_url.clone(),
            idle_ttl: config.session_idle_ttl,
            epoch: Instant::now(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn status(&self) -> ServiceStatus {
        if self.online.load(Ordering::Relaxed) {
            ServiceStatus::Online
        } else {
            ServiceStatus::Offline
        }
    }

    pub fn set_status(&self, status: ServiceStatus) {
        let previous = self.online.swap(status.is_online(), Ordering::Relaxed);
        if previous != status.is_online() {
            tracing::info!(status = status.as_str(), "Service status changed");
        }
    }

    #[allow(clippy::cast_possible_truncation)] // u64 millis covers ~585M years
    fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn touch(&self, handle: &SessionHandle) {
        handle.last_active.store(self.now_millis(), Ordering::Relaxed);
    }

    /// Create a session, send the greeting and start its runtime
    pub async fn create_session(&self) -> SessionHandle {
        let session_id = uuid::Uuid::new_v4().to_string();
        let context = ConvContext::new(&session_id, self.status().is_online(), &self.contact_url);

        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let busy = Arc::new(AtomicBool::new(false));

        let mut runtime = ConversationRuntime::new(
            context.clone(),
            self.providers.clone(),
            event_rx,
            broadcast_tx.clone(),
            busy.clone(),
        );
        runtime.start().await;
        let snapshot_rx = runtime.subscribe();

        let handle = SessionHandle {
            context,
            event_tx,
            broadcast_tx,
            snapshot_rx,
            busy,
            last_active: Arc::new(AtomicU64::new(self.now_millis())),
        };

        self.sessions
            .write()
            .await
            .insert(session_id.clone(), handle.clone());

        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(session_id = %session_id, "Session runtime finished");
        });

        handle
    }

    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        let handle = self.sessions.read().await.get(session_id).cloned()?;
        self.touch(&handle);
        Some(handle)
    }

    /// Queue a user event after checking it against the committed state.
    ///
    /// The check runs the same pure transition the runtime will run, so an
    /// accepted event is one the runtime will accept.
    pub async fn submit(&self, session_id: &str, event: Event) -> Result<(), SubmitError> {
        let handle = self.get(session_id).await.ok_or(SubmitError::NotFound)?;

        if !handle.try_begin() {
            return Err(SubmitError::Busy);
        }

        let state = handle.snapshot_rx.borrow().state.clone();
        if let Err(e) = transition(&state, &handle.context, event.clone()) {
            handle.release();
            return Err(e.into());
        }

        if handle.event_tx.send(event).await.is_err() {
            handle.release();
            return Err(SubmitError::Closed);
        }
        Ok(())
    }

    /// Current view plus a receiver for subsequent events
    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Option<(SessionView, broadcast::Receiver<SseEvent>)> {
        let handle = self.get(session_id).await?;
        // Subscribe first so nothing published after the view is missed
        let rx = handle.broadcast_tx.subscribe();
        Some((handle.view(), rx))
    }

    /// Drop a session; its runtime stops once the queue drains
    pub async fn close(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id);
        if removed.is_some() {
            tracing::info!(session_id = %session_id, "Session closed");
        }
        removed.is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Evict sessions idle for longer than the TTL. Busy sessions are kept.
    pub async fn evict_idle(&self) -> usize {
        let now = self.now_millis();
        let ttl = u64::try_from(self.idle_ttl.as_millis()).unwrap_or(u64::MAX);
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| {
            let idle = now.saturating_sub(handle.last_active.load(Ordering::Relaxed));
            handle.is_busy() || idle < ttl
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    /// Start the background task that evicts idle sessions
    pub fn start_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                manager.evict_idle().await;
            }
        })
    }
}
