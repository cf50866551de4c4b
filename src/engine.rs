//! The event pump: one inbound event, processed to completion.
//!
//! Flow: resolve the sender's role from the directory, take the sender's
//! session lock, run the dialog transition, then execute the returned
//! effects in order. The lock is held for the whole of that, so one event
//! completes before the next is accepted for the same participant; events
//! for different participants proceed concurrently.

use crate::db::Participant;
use crate::dialog::{Effect, Event, ParticipantId, Role, SessionStore, machine, menu};
use crate::directory::Directory;
use crate::error::EngineError;
use crate::relay::Dispatcher;
use crate::transport::{InboundEvent, Transport};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ties the dialog state machine to the directory, the session store and
/// the relay dispatcher.
pub struct Engine {
    directory: Directory,
    sessions: SessionStore,
    dispatcher: Dispatcher,
    transport: Arc<dyn Transport>,
}

impl Engine {
    pub fn new(directory: Directory, transport: Arc<dyn Transport>) -> Self {
        let dispatcher = Dispatcher::new(directory.clone(), Arc::clone(&transport));
        Self {
            directory,
            sessions: SessionStore::new(),
            dispatcher,
            transport,
        }
    }

    /// The transient session store (exposed for inspection).
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Process one inbound event to completion.
    pub async fn handle_event(&self, inbound: InboundEvent) -> Result<(), EngineError> {
        let InboundEvent {
            participant_id,
            handle,
            kind,
        } = inbound;

        let role = self.directory.resolve_role(participant_id, &handle).await?;
        let session = self.sessions.get_or_create(participant_id);
        let mut session = session.lock().await;
        let event = Event::from(kind);

        debug!(
            participant = participant_id,
            state = ?session.state,
            role = ?role,
            "Processing inbound event"
        );

        let effects = machine::transition(&mut session, role, &event);
        for effect in effects {
            self.execute(participant_id, role, effect).await?;
        }

        Ok(())
    }

    async fn execute(
        &self,
        sender: ParticipantId,
        role: Role,
        effect: Effect,
    ) -> Result<(), EngineError> {
        match effect {
            Effect::Reply(text) => {
                // A reply the sender cannot receive is their own delivery
                // failure; the dialog is not rolled back for it.
                if let Err(err) = self.transport.send_text(sender, &text).await {
                    warn!(
                        recipient = sender,
                        code = err.error_code(),
                        "Failed to send reply"
                    );
                }
            }
            Effect::ShowMenu => {
                let rendered = menu::render(role);
                if let Err(err) = self.transport.send_text(sender, &rendered).await {
                    warn!(
                        recipient = sender,
                        code = err.error_code(),
                        "Failed to send menu"
                    );
                }
            }
            Effect::Register {
                handle,
                display_name,
            } => {
                self.directory
                    .register(&Participant {
                        id: sender,
                        handle,
                        display_name,
                        role,
                    })
                    .await?;
            }
            Effect::Relay {
                filter,
                payload,
                exclude_sender,
            } => {
                let exclude = exclude_sender.then_some(sender);
                let report = self.dispatcher.deliver(filter, &payload, exclude).await?;
                info!(
                    filter = ?filter,
                    attempted = report.attempted,
                    succeeded = report.succeeded,
                    failed = ?report.failed,
                    "Relay dispatched"
                );
            }
        }
        Ok(())
    }
}
