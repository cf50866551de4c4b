//! Dialog core: state machine, role menus and session state.

pub mod machine;
pub mod menu;
pub mod session;

pub use menu::MenuEntry;
pub use session::{PendingPayload, Session, SessionStore};

use crate::relay::RoleFilter;
use crate::transport::EventKind;

/// Opaque participant identity, as handed out by the transport.
pub type ParticipantId = i64;

/// Opaque transport file reference for a photo or video.
///
/// Relayed bit-for-bit; the daemon never interprets it.
pub type MediaRef = String;

/// Fixed role of a registered participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Supervisor,
    Participant,
}

impl Role {
    /// The opposite role (relay target for submitted items).
    #[inline]
    pub fn other(self) -> Role {
        match self {
            Role::Supervisor => Role::Participant,
            Role::Participant => Role::Supervisor,
        }
    }
}

/// Per-session dialog position.
///
/// Ordered only for presentation; the values carry no numeric meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    /// Waiting for the participant to type their handle.
    RegisterHandle,
    /// Waiting for the participant to type their display name.
    RegisterName,
    /// Idle at the role-specific menu.
    Menu,
    /// Participant: waiting for an assignment photo with a caption.
    AwaitAssignment,
    /// Participant: waiting for a free-text theory question.
    AwaitTheoryQuestion,
    /// Supervisor: waiting for the reminder text.
    AwaitReminderText,
    /// Supervisor: waiting for a call recording video, then its title.
    AwaitCallRecording,
}

/// An inbound event after control-command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Text(String),
    Photo {
        media_ref: MediaRef,
        caption: Option<String>,
    },
    Video {
        media_ref: MediaRef,
    },
    /// Explicit "/start" command: re-initialize the session.
    Start,
    /// Explicit "/done" command: forced return to the menu.
    Done,
}

impl From<EventKind> for Event {
    /// Lift a transport event into a dialog event, recognizing the
    /// control commands.
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Text(text) => match text.trim() {
                "/start" => Event::Start,
                "/done" => Event::Done,
                _ => Event::Text(text),
            },
            EventKind::Photo { media_ref, caption } => Event::Photo { media_ref, caption },
            EventKind::Video { media_ref } => Event::Video { media_ref },
        }
    }
}

/// A deliverable item handed to the relay dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Photo { media_ref: MediaRef, caption: String },
    Video { media_ref: MediaRef, caption: String },
}

/// Externally visible action requested by a dialog transition.
///
/// The machine itself never touches the directory or the transport; the
/// engine executes these in order after the transition returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a text reply to the sender of the event.
    Reply(String),
    /// Present the sender's role-specific menu.
    ShowMenu,
    /// Persist a new participant record in the directory.
    Register {
        handle: String,
        display_name: String,
    },
    /// Fan the payload out to every directory member matching the filter.
    Relay {
        filter: RoleFilter,
        payload: Payload,
        exclude_sender: bool,
    },
}
