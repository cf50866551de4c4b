//! Role router: the fixed menus presented at the idle state.
//!
//! Presentation strings are decoupled from transition logic: each entry
//! pairs a label with the state it enters and the prompt shown on entry.
//! There is no dynamic personalization.

use crate::dialog::{DialogState, Role};

/// One selectable menu action.
#[derive(Debug)]
pub struct MenuEntry {
    /// Label the participant sends to select this action.
    pub label: &'static str,
    /// State entered when the action is selected.
    pub target: DialogState,
    /// Prompt sent on entry to the target state.
    pub prompt: &'static str,
}

const SUPERVISOR_MENU: &[MenuEntry] = &[
    MenuEntry {
        label: "Call reminder",
        target: DialogState::AwaitReminderText,
        prompt: "Enter the reminder text:",
    },
    MenuEntry {
        label: "Call recording",
        target: DialogState::AwaitCallRecording,
        prompt: "Upload the call recording video.",
    },
];

const PARTICIPANT_MENU: &[MenuEntry] = &[
    MenuEntry {
        label: "Assignment help",
        target: DialogState::AwaitAssignment,
        prompt: "Send a photo of the assignment with a description of the problem.",
    },
    MenuEntry {
        label: "Theory question",
        target: DialogState::AwaitTheoryQuestion,
        prompt: "Describe what is unclear about the theory.",
    },
];

/// The ordered menu for a role.
pub fn menu(role: Role) -> &'static [MenuEntry] {
    match role {
        Role::Supervisor => SUPERVISOR_MENU,
        Role::Participant => PARTICIPANT_MENU,
    }
}

/// Look up a menu entry by its label (case-insensitive, trimmed).
pub fn find(role: Role, label: &str) -> Option<&'static MenuEntry> {
    let label = label.trim();
    menu(role)
        .iter()
        .find(|entry| entry.label.eq_ignore_ascii_case(label))
}

/// Render the menu prompt for a role.
pub fn render(role: Role) -> String {
    let mut out = String::from("Choose an action:");
    for entry in menu(role) {
        out.push_str("\n - ");
        out.push_str(entry.label);
    }
    out
}
