//! mentord - Role-aware mentoring relay daemon.
//!
//! Walks a remote participant through a registration dialog, routes them
//! into a role-specific menu (supervisor vs. participant) and relays
//! structured content between the two roles: assignment photos and theory
//! questions flow up to the supervisors, reminders and review-call
//! recordings fan out to the participants.

pub mod config;
pub mod db;
pub mod dialog;
pub mod directory;
pub mod engine;
pub mod error;
pub mod relay;
pub mod transport;

pub use config::Config;
pub use db::{Database, Participant};
pub use dialog::{DialogState, Effect, Event, Payload, Role};
pub use directory::Directory;
pub use engine::Engine;
pub use relay::{DeliveryReport, Dispatcher, RoleFilter};
pub use transport::{EventKind, InboundEvent, Transport};
