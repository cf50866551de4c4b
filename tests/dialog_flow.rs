//! End-to-end dialog flows through the engine: registration, menu routing
//! and role-filtered relays, with an in-memory database and a recording
//! transport standing in for the TCP gateway.

use async_trait::async_trait;
use mentord::db::Database;
use mentord::dialog::{DialogState, MediaRef, ParticipantId};
use mentord::directory::Directory;
use mentord::engine::Engine;
use mentord::transport::{EventKind, InboundEvent, Transport, TransportError};
use mentord::Role;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Records every send; fails for a configurable set of recipients.
struct RecordingTransport {
    fail_for: Mutex<HashSet<ParticipantId>>,
    sent: Mutex<Vec<(ParticipantId, String)>>,
}

impl RecordingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            fail_for: Mutex::new(HashSet::new()),
            sent: Mutex::new(Vec::new()),
        })
    }

    async fn set_failing(&self, id: ParticipantId) {
        self.fail_for.lock().await.insert(id);
    }

    async fn record(&self, to: ParticipantId, line: String) -> Result<(), TransportError> {
        if self.fail_for.lock().await.contains(&to) {
            return Err(TransportError::NotConnected(to));
        }
        self.sent.lock().await.push((to, line));
        Ok(())
    }

    /// Everything delivered to one recipient, in order.
    async fn lines_for(&self, id: ParticipantId) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(to, _)| *to == id)
            .map(|(_, line)| line.clone())
            .collect()
    }

    async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, to: ParticipantId, text: &str) -> Result<(), TransportError> {
        self.record(to, format!("text|{text}")).await
    }

    async fn send_photo(
        &self,
        to: ParticipantId,
        media_ref: &MediaRef,
        caption: &str,
    ) -> Result<(), TransportError> {
        self.record(to, format!("photo|{media_ref}|{caption}")).await
    }

    async fn send_video(
        &self,
        to: ParticipantId,
        media_ref: &MediaRef,
        caption: &str,
    ) -> Result<(), TransportError> {
        self.record(to, format!("video|{media_ref}|{caption}")).await
    }
}

async fn engine_with_allowlist(
    allowlist: &[&str],
) -> (Engine, Directory, Arc<RecordingTransport>) {
    let db = Database::new(":memory:").await.expect("in-memory db");
    let handles: Vec<String> = allowlist.iter().map(|s| s.to_string()).collect();
    let directory = Directory::new(db, &handles);
    let transport = RecordingTransport::new();
    let engine = Engine::new(directory.clone(), transport.clone());
    (engine, directory, transport)
}

async fn send_text(engine: &Engine, id: ParticipantId, handle: &str, text: &str) {
    engine
        .handle_event(InboundEvent {
            participant_id: id,
            handle: handle.to_string(),
            kind: EventKind::Text(text.to_string()),
        })
        .await
        .expect("event should be processed");
}

async fn send_kind(engine: &Engine, id: ParticipantId, handle: &str, kind: EventKind) {
    engine
        .handle_event(InboundEvent {
            participant_id: id,
            handle: handle.to_string(),
            kind,
        })
        .await
        .expect("event should be processed");
}

/// Drives one user through /start -> handle -> name.
async fn register(engine: &Engine, id: ParticipantId, handle: &str, name: &str) {
    send_text(engine, id, handle, "/start").await;
    send_text(engine, id, handle, handle).await;
    send_text(engine, id, handle, name).await;
}

async fn session_state(engine: &Engine, id: ParticipantId) -> DialogState {
    engine.sessions().get_or_create(id).lock().await.state
}

#[tokio::test]
async fn test_registration_creates_a_record_and_lands_in_the_menu() {
    let (engine, _directory, transport) = engine_with_allowlist(&["coach"]).await;

    register(&engine, 100, "ann", "Ann K").await;

    assert_eq!(session_state(&engine, 100).await, DialogState::Menu);

    let lines = transport.lines_for(100).await;
    assert!(lines[0].contains("Welcome!"), "participant greeting: {lines:?}");
    assert!(lines.iter().any(|l| l.contains("You are registered.")));
    assert!(
        lines.iter().any(|l| l.contains("Assignment help")),
        "menu shown after registration"
    );

    // Allowlisted handles are greeted and registered as supervisors.
    register(&engine, 1, "coach", "Coach V").await;
    let lines = transport.lines_for(1).await;
    assert!(lines[0].contains("Hello, supervisor!"));
}

#[tokio::test]
async fn test_duplicate_registration_is_silently_ignored() {
    let (engine, directory, _transport) = engine_with_allowlist(&[]).await;

    register(&engine, 100, "ann", "Ann K").await;
    register(&engine, 100, "ann2", "Second Try").await;

    assert_eq!(directory.count().await.expect("count"), 1);
    // The original record survives.
    assert_eq!(
        directory.role_of(100).await.expect("role"),
        Some(Role::Participant)
    );
}

#[tokio::test]
async fn test_reminder_fans_out_to_participants_only() {
    let (engine, _directory, transport) = engine_with_allowlist(&["coach"]).await;
    register(&engine, 1, "coach", "Coach V").await;
    register(&engine, 100, "ann", "Ann K").await;
    register(&engine, 101, "bob", "Bob L").await;
    transport.clear().await;

    send_text(&engine, 1, "coach", "Call reminder").await;
    send_text(&engine, 1, "coach", "Review call at 5pm").await;

    for id in [100, 101] {
        let lines = transport.lines_for(id).await;
        assert_eq!(
            lines,
            vec!["text|Review call at 5pm".to_string()],
            "participant {id} gets the untagged reminder"
        );
    }
    // The supervisor only sees the prompt and the confirmation.
    let lines = transport.lines_for(1).await;
    assert!(!lines.contains(&"text|Review call at 5pm".to_string()));
    assert!(lines.iter().any(|l| l.contains("Reminder sent to all participants.")));
    assert_eq!(session_state(&engine, 1).await, DialogState::Menu);
}

#[tokio::test]
async fn test_assignment_photo_reaches_supervisors_tagged_and_untouched() {
    let (engine, _directory, transport) = engine_with_allowlist(&["coach"]).await;
    register(&engine, 1, "coach", "Coach V").await;
    register(&engine, 100, "ann", "Ann K").await;
    transport.clear().await;

    send_text(&engine, 100, "ann", "Assignment help").await;
    send_kind(
        &engine,
        100,
        "ann",
        EventKind::Photo {
            media_ref: "file-abc-123".to_string(),
            caption: Some("stuck on step 3".to_string()),
        },
    )
    .await;

    let lines = transport.lines_for(1).await;
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("photo|file-abc-123|"));
    assert!(lines[0].contains("Assignment from Ann K (ann):"));
    assert!(lines[0].contains("stuck on step 3"));

    let lines = transport.lines_for(100).await;
    assert!(lines.iter().any(|l| l.contains("Assignment sent to your supervisors.")));
    assert_eq!(session_state(&engine, 100).await, DialogState::Menu);
}

#[tokio::test]
async fn test_captionless_photo_is_reprompted_and_not_delivered() {
    let (engine, _directory, transport) = engine_with_allowlist(&["coach"]).await;
    register(&engine, 1, "coach", "Coach V").await;
    register(&engine, 100, "ann", "Ann K").await;
    transport.clear().await;

    send_text(&engine, 100, "ann", "Assignment help").await;
    send_kind(
        &engine,
        100,
        "ann",
        EventKind::Photo {
            media_ref: "file-abc-123".to_string(),
            caption: None,
        },
    )
    .await;

    assert!(transport.lines_for(1).await.is_empty(), "nothing reaches the supervisor");
    assert_eq!(
        session_state(&engine, 100).await,
        DialogState::AwaitAssignment,
        "the dialog stays where it was"
    );
}

#[tokio::test]
async fn test_call_recording_video_then_title() {
    let (engine, _directory, transport) = engine_with_allowlist(&["coach"]).await;
    register(&engine, 1, "coach", "Coach V").await;
    register(&engine, 100, "ann", "Ann K").await;
    transport.clear().await;

    send_text(&engine, 1, "coach", "Call recording").await;
    send_kind(
        &engine,
        1,
        "coach",
        EventKind::Video {
            media_ref: "vid-42".to_string(),
        },
    )
    .await;
    // Still waiting for the title; nothing delivered yet.
    assert!(transport.lines_for(100).await.is_empty());

    send_text(&engine, 1, "coach", "Week 4 review").await;

    let lines = transport.lines_for(100).await;
    assert_eq!(lines, vec!["video|vid-42|Call recording: Week 4 review".to_string()]);
    assert_eq!(session_state(&engine, 1).await, DialogState::Menu);
}

#[tokio::test]
async fn test_delivery_failure_is_isolated_per_recipient() {
    let (engine, _directory, transport) = engine_with_allowlist(&["coach"]).await;
    register(&engine, 1, "coach", "Coach V").await;
    register(&engine, 100, "ann", "Ann K").await;
    register(&engine, 101, "bob", "Bob L").await;
    transport.clear().await;
    transport.set_failing(100).await;

    send_text(&engine, 1, "coach", "Call reminder").await;
    send_text(&engine, 1, "coach", "Call at 5pm").await;

    assert!(transport.lines_for(100).await.is_empty());
    assert_eq!(
        transport.lines_for(101).await,
        vec!["text|Call at 5pm".to_string()],
        "recipient after the failed one is still reached"
    );
    // The supervisor's dialog completed normally.
    assert!(transport
        .lines_for(1)
        .await
        .iter()
        .any(|l| l.contains("Reminder sent to all participants.")));
}

#[tokio::test]
async fn test_done_returns_to_the_menu_without_side_effects() {
    let (engine, _directory, transport) = engine_with_allowlist(&["coach"]).await;
    register(&engine, 1, "coach", "Coach V").await;
    register(&engine, 100, "ann", "Ann K").await;
    transport.clear().await;

    send_text(&engine, 100, "ann", "Theory question").await;
    assert_eq!(
        session_state(&engine, 100).await,
        DialogState::AwaitTheoryQuestion
    );

    send_text(&engine, 100, "ann", "/done").await;
    assert_eq!(session_state(&engine, 100).await, DialogState::Menu);
    // No confirmation, no relay.
    let supervisor_lines = transport.lines_for(1).await;
    assert!(supervisor_lines.is_empty());
}
