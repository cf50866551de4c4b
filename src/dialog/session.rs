//! Ephemeral per-participant dialog sessions.
//!
//! Sessions live only in memory. A restart drops them all; the durable
//! participant record survives, but a returning participant still walks
//! the registration dialog again in a fresh session.

use crate::dialog::{DialogState, MediaRef, ParticipantId};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// At most one in-flight attachment waiting for its second piece of input.
///
/// Overwritten, never merged, on each new attachment event: last write wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingPayload {
    /// A photo staged with its caption.
    Photo { media_ref: MediaRef, caption: String },
    /// A video awaiting a title.
    Video { media_ref: MediaRef },
}

/// Dialog progress for one participant.
#[derive(Debug)]
pub struct Session {
    pub participant_id: ParticipantId,
    pub state: DialogState,
    /// Handle typed during registration; tags relayed items.
    pub handle: Option<String>,
    /// Display name typed during registration; tags relayed items.
    pub display_name: Option<String>,
    /// In-flight attachment, if any.
    pub pending: Option<PendingPayload>,
}

impl Session {
    /// Fresh session at the start of the registration dialog.
    pub fn new(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            state: DialogState::RegisterHandle,
            handle: None,
            display_name: None,
            pending: None,
        }
    }

    /// Re-initialize to the start of registration (the "/start" command).
    pub fn reset(&mut self) {
        self.state = DialogState::RegisterHandle;
        self.handle = None;
        self.display_name = None;
        self.pending = None;
    }

    /// Sender tag for relayed items: "Name (handle)".
    ///
    /// Both fields are set by the time any relaying state is reachable.
    pub fn sender_tag(&self) -> String {
        format!(
            "{} ({})",
            self.display_name.as_deref().unwrap_or("?"),
            self.handle.as_deref().unwrap_or("?")
        )
    }
}

/// Transient map from participant id to session, serialized per id.
///
/// Each session sits behind its own `tokio::sync::Mutex`: the worker
/// servicing a participant's event holds that participant's lock for the
/// full transition + effect execution, so one inbound event completes
/// before the next is accepted for the same participant. Events for
/// different participants proceed concurrently with no shared lock.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<ParticipantId, Arc<Mutex<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the session for a participant, creating one in
    /// [`DialogState::RegisterHandle`] if this is the first event seen.
    pub fn get_or_create(&self, participant_id: ParticipantId) -> Arc<Mutex<Session>> {
        self.sessions
            .entry(participant_id)
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(participant_id))))
            .clone()
    }

    /// Drop a participant's session, if present.
    pub fn clear(&self, participant_id: ParticipantId) {
        self.sessions.remove(&participant_id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_starts_at_register_handle() {
        let store = SessionStore::new();
        let session = store.get_or_create(42);
        let session = session.lock().await;
        assert_eq!(session.state, DialogState::RegisterHandle);
        assert!(session.pending.is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_get_or_create_returns_same_session() {
        let store = SessionStore::new();
        {
            let session = store.get_or_create(7);
            session.lock().await.state = DialogState::Menu;
        }
        let session = store.get_or_create(7);
        assert_eq!(session.lock().await.state, DialogState::Menu);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_forgets_dialog_progress() {
        let store = SessionStore::new();
        {
            let session = store.get_or_create(7);
            session.lock().await.state = DialogState::AwaitTheoryQuestion;
        }
        store.clear(7);
        assert!(store.is_empty());

        // A later event gets a fresh registration dialog.
        let session = store.get_or_create(7);
        assert_eq!(session.lock().await.state, DialogState::RegisterHandle);
    }

    #[test]
    fn test_pending_is_overwritten_not_merged() {
        let mut session = Session::new(1);
        session.pending = Some(PendingPayload::Photo {
            media_ref: "photo-1".into(),
            caption: "first".into(),
        });
        session.pending = Some(PendingPayload::Video {
            media_ref: "video-2".into(),
        });
        assert_eq!(
            session.pending,
            Some(PendingPayload::Video {
                media_ref: "video-2".into()
            })
        );
    }

    #[test]
    fn test_reset_clears_drafts_and_pending() {
        let mut session = Session::new(1);
        session.state = DialogState::AwaitCallRecording;
        session.handle = Some("ann".into());
        session.display_name = Some("Ann K".into());
        session.pending = Some(PendingPayload::Video {
            media_ref: "v".into(),
        });

        session.reset();
        assert_eq!(session.state, DialogState::RegisterHandle);
        assert!(session.handle.is_none());
        assert!(session.display_name.is_none());
        assert!(session.pending.is_none());
    }
}
