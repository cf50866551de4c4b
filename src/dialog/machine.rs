//! The dialog state machine.
//!
//! [`transition`] is a pure function with respect to the directory and the
//! transport: it mutates only the session it is given and expresses every
//! externally visible action as an [`Effect`] for the engine to execute.
//!
//! Inputs with no entry in the transition table never advance the session;
//! they are rejected internally as a [`DialogError`] and mapped to a
//! re-prompt of the current state's instructions.

use crate::dialog::{DialogState, Effect, Event, Payload, Role, menu};
use crate::dialog::session::{PendingPayload, Session};
use crate::error::DialogError;
use crate::relay::RoleFilter;
use tracing::debug;

/// Apply one inbound event to a session.
///
/// Returns the effects to execute, in order. Never fails: rejected inputs
/// leave the session unchanged and yield a single re-prompt reply.
pub fn transition(session: &mut Session, role: Role, event: &Event) -> Vec<Effect> {
    match step(session, role, event) {
        Ok(effects) => effects,
        Err(err) => {
            debug!(
                participant = session.participant_id,
                state = ?session.state,
                code = err.error_code(),
                "dialog input rejected, re-prompting"
            );
            vec![Effect::Reply(prompt_for(session.state, role))]
        }
    }
}

/// The instructions re-sent when an input is rejected in a given state.
pub fn prompt_for(state: DialogState, role: Role) -> String {
    match state {
        DialogState::RegisterHandle => "Enter your handle:".to_string(),
        DialogState::RegisterName => "Now enter your name:".to_string(),
        DialogState::Menu => menu::render(role),
        // Every awaiting state is entered through exactly one menu entry.
        state => menu::menu(Role::Participant)
            .iter()
            .chain(menu::menu(Role::Supervisor))
            .find(|entry| entry.target == state)
            .map(|entry| entry.prompt.to_string())
            .unwrap_or_else(|| menu::render(role)),
    }
}

/// Greeting sent when a session (re)enters the registration dialog.
fn welcome(role: Role) -> String {
    match role {
        Role::Supervisor => "Hello, supervisor! Enter your handle:".to_string(),
        Role::Participant => "Welcome! Enter your handle:".to_string(),
    }
}

fn step(session: &mut Session, role: Role, event: &Event) -> Result<Vec<Effect>, DialogError> {
    // Control commands are accepted in every state.
    match event {
        Event::Start => {
            session.reset();
            return Ok(vec![Effect::Reply(welcome(role))]);
        }
        Event::Done => {
            // Forced reset to the menu, no confirmation, no side effects.
            session.state = DialogState::Menu;
            return Ok(Vec::new());
        }
        _ => {}
    }

    match session.state {
        DialogState::RegisterHandle => match event {
            Event::Text(handle) => {
                session.handle = Some(handle.clone());
                session.state = DialogState::RegisterName;
                Ok(vec![Effect::Reply(format!(
                    "Your handle: {handle}\nNow enter your name:"
                ))])
            }
            _ => Err(DialogError::UnknownInput),
        },

        DialogState::RegisterName => match event {
            Event::Text(name) => {
                session.display_name = Some(name.clone());
                session.state = DialogState::Menu;
                Ok(vec![
                    Effect::Register {
                        handle: session.handle.clone().unwrap_or_default(),
                        display_name: name.clone(),
                    },
                    Effect::Reply("You are registered.".to_string()),
                    Effect::ShowMenu,
                ])
            }
            _ => Err(DialogError::UnknownInput),
        },

        DialogState::Menu => match event {
            Event::Text(label) => {
                if let Some(entry) = menu::find(role, label) {
                    session.state = entry.target;
                    Ok(vec![Effect::Reply(entry.prompt.to_string())])
                } else if menu::find(role.other(), label).is_some() {
                    // The other role's action: rejected, not silently accepted.
                    Err(DialogError::WrongRoleAction)
                } else {
                    Err(DialogError::UnknownInput)
                }
            }
            _ => Err(DialogError::UnknownInput),
        },

        DialogState::AwaitAssignment => match event {
            Event::Photo {
                media_ref,
                caption: Some(caption),
            } => {
                session.state = DialogState::Menu;
                let caption = format!("Assignment from {}:\n{}", session.sender_tag(), caption);
                Ok(vec![
                    Effect::Relay {
                        filter: RoleFilter::AllSupervisors,
                        payload: Payload::Photo {
                            media_ref: media_ref.clone(),
                            caption,
                        },
                        exclude_sender: true,
                    },
                    Effect::Reply("Assignment sent to your supervisors.".to_string()),
                ])
            }
            Event::Photo { caption: None, .. } => Err(DialogError::MissingAttachment),
            _ => Err(DialogError::UnknownInput),
        },

        DialogState::AwaitTheoryQuestion => match event {
            Event::Text(question) => {
                session.state = DialogState::Menu;
                let text = format!(
                    "Theory question from {}:\n{}",
                    session.sender_tag(),
                    question
                );
                Ok(vec![
                    Effect::Relay {
                        filter: RoleFilter::AllSupervisors,
                        payload: Payload::Text(text),
                        exclude_sender: true,
                    },
                    Effect::Reply("Your theory question was passed to the supervisors.".to_string()),
                ])
            }
            _ => Err(DialogError::UnknownInput),
        },

        DialogState::AwaitReminderText => match event {
            Event::Text(reminder) => {
                session.state = DialogState::Menu;
                // Untagged text, fanned out to every participant.
                Ok(vec![
                    Effect::Relay {
                        filter: RoleFilter::AllParticipants,
                        payload: Payload::Text(reminder.clone()),
                        exclude_sender: true,
                    },
                    Effect::Reply("Reminder sent to all participants.".to_string()),
                ])
            }
            _ => Err(DialogError::UnknownInput),
        },

        DialogState::AwaitCallRecording => match event {
            Event::Video { media_ref } => {
                // Last write wins: a second upload replaces the staged one.
                session.pending = Some(PendingPayload::Video {
                    media_ref: media_ref.clone(),
                });
                Ok(vec![Effect::Reply(
                    "Enter a title for the recording:".to_string(),
                )])
            }
            Event::Text(title) => match session.pending.take() {
                Some(PendingPayload::Video { media_ref }) => {
                    session.state = DialogState::Menu;
                    Ok(vec![
                        Effect::Relay {
                            filter: RoleFilter::AllParticipants,
                            payload: Payload::Video {
                                media_ref,
                                caption: format!("Call recording: {title}"),
                            },
                            exclude_sender: true,
                        },
                        Effect::Reply("Recording sent to all participants.".to_string()),
                    ])
                }
                other => {
                    session.pending = other;
                    Err(DialogError::MissingAttachment)
                }
            },
            _ => Err(DialogError::UnknownInput),
        },
    }
}
