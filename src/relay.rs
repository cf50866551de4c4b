//! Broadcast/relay dispatcher.
//!
//! Fans one payload out to every directory member matching a role filter,
//! sequentially, awaiting each send. Per-recipient failures are recorded
//! in the [`DeliveryReport`] and skipped; they never abort the remaining
//! deliveries and are never retried.

use crate::db::DbError;
use crate::dialog::{ParticipantId, Payload, Role};
use crate::directory::Directory;
use crate::transport::Transport;
use std::sync::Arc;
use tracing::warn;

/// Directory subset selector for fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleFilter {
    AllSupervisors,
    AllParticipants,
}

impl RoleFilter {
    /// The role this filter selects.
    #[inline]
    pub fn role(self) -> Role {
        match self {
            RoleFilter::AllSupervisors => Role::Supervisor,
            RoleFilter::AllParticipants => Role::Participant,
        }
    }
}

/// Outcome of one `deliver` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Recipients the dispatcher tried to reach (after exclusion).
    pub attempted: usize,
    /// Recipients the transport acknowledged.
    pub succeeded: usize,
    /// Recipients whose send failed, in delivery order.
    pub failed: Vec<ParticipantId>,
}

/// Role-filtered fan-out over the directory.
pub struct Dispatcher {
    directory: Directory,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(directory: Directory, transport: Arc<dyn Transport>) -> Self {
        Self {
            directory,
            transport,
        }
    }

    /// Deliver a payload to every directory member matching the filter,
    /// optionally excluding the sender.
    ///
    /// Delivery order equals directory enumeration order. Only a directory
    /// read failure aborts the call; send failures are isolated per
    /// recipient.
    pub async fn deliver(
        &self,
        filter: RoleFilter,
        payload: &Payload,
        exclude: Option<ParticipantId>,
    ) -> Result<DeliveryReport, DbError> {
        let ids = self.directory.list_ids(filter.role()).await?;

        let mut report = DeliveryReport::default();
        for id in ids {
            if Some(id) == exclude {
                continue;
            }
            report.attempted += 1;

            let result = match payload {
                Payload::Text(text) => self.transport.send_text(id, text).await,
                Payload::Photo { media_ref, caption } => {
                    self.transport.send_photo(id, media_ref, caption).await
                }
                Payload::Video { media_ref, caption } => {
                    self.transport.send_video(id, media_ref, caption).await
                }
            };

            match result {
                Ok(()) => report.succeeded += 1,
                Err(err) => {
                    warn!(
                        recipient = id,
                        code = err.error_code(),
                        error = %err,
                        "Delivery failed, skipping recipient"
                    );
                    report.failed.push(id);
                }
            }
        }

        Ok(report)
    }
}
