//! Unified error handling for mentord.
//!
//! Dialog-level errors are always recovered locally: the engine maps them
//! to a re-prompt of the current state's instructions and the session does
//! not advance. Only transport initialization and database failures are
//! allowed to escape to the operator.

use thiserror::Error;

// ============================================================================
// Dialog Errors (state machine input rejection)
// ============================================================================

/// Errors raised while matching an inbound event against the dialog
/// state table.
///
/// None of these are fatal; each maps to a re-prompt with the session
/// state left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DialogError {
    /// A photo arrived without the required caption, or a recording title
    /// arrived before any video was uploaded.
    #[error("missing attachment or caption")]
    MissingAttachment,

    /// A menu choice that belongs to the other role.
    #[error("action not available for this role")]
    WrongRoleAction,

    /// An event with no entry in the transition table for the current state.
    #[error("input not understood in the current state")]
    UnknownInput,
}

impl DialogError {
    /// Static error code for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingAttachment => "missing_attachment",
            Self::WrongRoleAction => "wrong_role_action",
            Self::UnknownInput => "unknown_input",
        }
    }
}

// ============================================================================
// Engine Errors (event-loop scope)
// ============================================================================

/// Errors that abort processing of a single inbound event.
///
/// Per-recipient delivery failures never surface here; they are recorded
/// in the [`crate::relay::DeliveryReport`] instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("directory error: {0}")]
    Db(#[from] crate::db::DbError),
}

// TransportError lives in the transport module and DbError in the db module,
// next to the I/O types they wrap.
