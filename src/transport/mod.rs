//! Transport seam: inbound events and outbound sends.
//!
//! The dialog core consumes this interface; it never manages connections
//! itself. The bundled line-oriented TCP gateway lives in [`tcp`]; tests
//! substitute a recording mock.

pub mod tcp;

use crate::dialog::{MediaRef, ParticipantId};
use async_trait::async_trait;
use thiserror::Error;

/// Transport-level send failures.
///
/// Always per-recipient: recorded in the delivery report and skipped,
/// never propagated as fatal.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("participant {0} has no live connection")]
    NotConnected(ParticipantId),

    #[error("connection closed while sending")]
    ConnectionClosed,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Static error code for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotConnected(_) => "not_connected",
            Self::ConnectionClosed => "connection_closed",
            Self::Io(_) => "io_error",
        }
    }
}

/// An event received from a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub participant_id: ParticipantId,
    /// Transport-level handle (checked against the supervisor allowlist).
    pub handle: String,
    pub kind: EventKind,
}

/// Raw event payload, before control-command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Text(String),
    Photo {
        media_ref: MediaRef,
        caption: Option<String>,
    },
    Video {
        media_ref: MediaRef,
    },
}

/// Outbound side of the transport. All sends are fallible and may suspend
/// pending acknowledgment; the relay dispatcher awaits each one before
/// issuing the next.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, to: ParticipantId, text: &str) -> Result<(), TransportError>;

    async fn send_photo(
        &self,
        to: ParticipantId,
        media_ref: &MediaRef,
        caption: &str,
    ) -> Result<(), TransportError>;

    async fn send_video(
        &self,
        to: ParticipantId,
        media_ref: &MediaRef,
        caption: &str,
    ) -> Result<(), TransportError>;
}
