//! Conversation runtime executor

use super::traits::Providers;
use super::{Snapshot, SseEvent};
use crate::providers::ProviderError;
use crate::state_machine::{
    transition, ConvContext, Effect, Event, ProviderCall, TransitionError,
};
use crate::store::{ConversationStore, Message, MessageId, OutboundMessage};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, watch};

/// Owns one session's store and applies events to it one at a time
pub struct ConversationRuntime {
    context: ConvContext,
    store: ConversationStore,
    providers: Providers,
    event_rx: mpsc::Receiver<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    snapshot_tx: watch::Sender<Snapshot>,
    busy: Arc<AtomicBool>,
}

impl ConversationRuntime {
    pub fn new(
        context: ConvContext,
        providers: Providers,
        event_rx: mpsc::Receiver<Event>,
        broadcast_tx: broadcast::Sender<SseEvent>,
        busy: Arc<AtomicBool>,
    ) -> Self {
        let store = ConversationStore::new(&context.session_id);
        let (snapshot_tx, _) = watch::channel(Snapshot {
            view: store.view(),
            state: store.state().clone(),
        });
        Self {
            context,
            store,
            providers,
            event_rx,
            broadcast_tx,
            snapshot_tx,
            busy,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Send the greeting (or the offline notice)
    pub async fn start(&mut self) {
        if let Err(e) = self.process_event(Event::SessionStarted).await {
            tracing::error!(session_id = %self.context.session_id, error = %e, "Failed to start session");
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting session runtime");

        // Process events in a loop - no recursion
        while let Some(event) = self.event_rx.recv().await {
            if let Err(e) = self.process_event(event).await {
                tracing::warn!(session_id = %self.context.session_id, error = %e, "Event rejected");
                self.announce(SseEvent::Error {
                    message: e.to_string(),
                });
            }
        }

        tracing::info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    /// Handle one incoming event and everything it triggers.
    ///
    /// The typing flag is raised for the duration and always cleared. The
    /// busy flag claimed by the submitter is released only after the final
    /// snapshot is published.
    async fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        self.set_typing(true);
        let outcome = self.drive(event).await;
        self.set_typing(false);
        self.publish();
        self.busy.store(false, Ordering::Release);
        outcome
    }

    async fn drive(&mut self, event: Event) -> Result<(), TransitionError> {
        let from_user = event.is_user_input();

        // We need to process events in a loop to handle provider outcomes
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = match transition(self.store.state(), &self.context, current_event) {
                Ok(r) => r,
                Err(e) if self.store.state().is_busy() => {
                    // A provider outcome the state machine refused; settle the
                    // request as failed so the session stays usable
                    tracing::error!(session_id = %self.context.session_id, error = %e, "Provider outcome rejected");
                    events_to_process.push(Event::ProviderFailed {
                        error: ProviderError::unknown(e.to_string()),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            let old_phase = self.store.state().phase.clone();
            self.store.set_state(result.new_state);
            if old_phase != self.store.state().phase {
                tracing::info!(
                    session_id = %self.context.session_id,
                    from = old_phase.name(),
                    to = self.store.state().phase.name(),
                    from_user,
                    "Phase changed"
                );
                self.publish();
                self.announce(SseEvent::StateChange {
                    state: self.store.state().clone(),
                });
            }

            // Execute effects in order and collect generated events
            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    async fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::Append(message) => {
                self.append(message);
                None
            }
            Effect::Request { call, transient } => {
                let notice = transient.map(|message| self.show_transient(message));
                let event = perform(self.providers.clone(), &self.context.session_id, call).await;
                // Settled, whatever the outcome
                if let Some(id) = notice {
                    self.retract_transient(id);
                }
                Some(event)
            }
        }
    }

    // Every helper below publishes the snapshot before announcing the change,
    // so a client that subscribes in between finds it in its initial view.

    fn append(&mut self, message: OutboundMessage) {
        let message = self.stage_append(message);
        self.announce(SseEvent::Message { message });
    }

    fn stage_append(&mut self, message: OutboundMessage) -> Message {
        let message = self.store.append(message).clone();
        self.publish();
        message
    }

    fn show_transient(&mut self, message: OutboundMessage) -> MessageId {
        let (replaced, message) = self.store.show_transient(message);
        let message = message.clone();
        self.publish();
        if let Some(id) = replaced {
            self.announce(SseEvent::Retract { id });
        }
        let id = message.id;
        self.announce(SseEvent::Message { message });
        id
    }

    fn retract_transient(&mut self, id: MessageId) {
        if self.stage_retract(id) {
            self.announce(SseEvent::Retract { id });
        }
    }

    fn stage_retract(&mut self, id: MessageId) -> bool {
        let retracted = self.store.retract_transient(id);
        if retracted {
            self.publish();
        }
        retracted
    }

    fn set_typing(&mut self, is_typing: bool) {
        if self.store.is_typing() != is_typing {
            self.store.set_typing(is_typing);
            self.publish();
            self.announce(SseEvent::Typing { is_typing });
        }
    }

    fn announce(&self, event: SseEvent) {
        let _ = self.broadcast_tx.send(event);
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(Snapshot {
            view: self.store.view(),
            state: self.store.state().clone(),
        });
    }
}

/// Run a backend call; errors and panics both come back as `ProviderFailed`
async fn perform(providers: Providers, session_id: &str, call: ProviderCall) -> Event {
    let name = call.name();
    let start = Instant::now();
    let outcome = AssertUnwindSafe(call_provider(providers, call))
        .catch_unwind()
        .await;
    match outcome {
        Ok(event) => {
            tracing::debug!(
                session_id = %session_id,
                call = name,
                duration_ms = %start.elapsed().as_millis(),
                "Backend call settled"
            );
            event
        }
        Err(_) => {
            tracing::error!(session_id = %session_id, call = name, "Backend call panicked");
            Event::ProviderFailed {
                error: ProviderError::unknown(format!("{name} call panicked")),
            }
        }
    }
}

async fn call_provider(providers: Providers, call: ProviderCall) -> Event {
    match call {
        ProviderCall::CheckReachability { url } => {
            let reachable = providers.reachability.is_reachable(&url).await;
            Event::ReachabilityChecked { url, reachable }
        }
        ProviderCall::Audit { url } => match providers.audit.audit(&url).await {
            Ok(report) => Event::AuditCompleted { report },
            Err(error) => Event::ProviderFailed { error },
        },
        ProviderCall::Search { query } => match providers.search.search(&query).await {
            Ok(hits) => Event::SearchCompleted { hits },
            Err(error) => Event::ProviderFailed { error },
        },
        ProviderCall::Generate { request } => match providers.chat.complete(&request).await {
            Ok(reply) => Event::ReplyGenerated { reply },
            Err(error) => Event::ProviderFailed { error },
        },
    }
}
