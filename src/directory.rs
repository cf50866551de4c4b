//! The participant directory: role resolution and registration.
//!
//! Role resolution is a data lookup: the role column on the durable
//! participant record wins. The configured allowlist of handles is only
//! consulted for users who have not registered yet, to decide which role
//! they will register with.

use crate::db::{Database, DbError, Participant};
use crate::dialog::{ParticipantId, Role};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Read-mostly view over the participant table plus the supervisor
/// allowlist.
#[derive(Clone)]
pub struct Directory {
    db: Database,
    /// Lowercased supervisor handles from the config.
    supervisors: Arc<HashSet<String>>,
}

impl Directory {
    pub fn new(db: Database, supervisor_handles: &[String]) -> Self {
        let supervisors = supervisor_handles
            .iter()
            .map(|h| h.to_ascii_lowercase())
            .collect();
        Self {
            db,
            supervisors: Arc::new(supervisors),
        }
    }

    /// Whether a transport handle is on the supervisor allowlist.
    pub fn allowlisted(&self, handle: &str) -> bool {
        self.supervisors.contains(&handle.to_ascii_lowercase())
    }

    /// Role attached to an inbound event.
    ///
    /// The durable record wins; an unregistered user gets the role their
    /// transport handle would register with.
    pub async fn resolve_role(&self, id: ParticipantId, handle: &str) -> Result<Role, DbError> {
        if let Some(role) = self.db.participants().get_role(id).await? {
            return Ok(role);
        }
        Ok(if self.allowlisted(handle) {
            Role::Supervisor
        } else {
            Role::Participant
        })
    }

    /// Role of a registered participant, if any.
    pub async fn role_of(&self, id: ParticipantId) -> Result<Option<Role>, DbError> {
        self.db.participants().get_role(id).await
    }

    /// Persist a new participant record.
    ///
    /// A duplicate id is ignored without corrupting the existing record;
    /// the registrant is never told.
    pub async fn register(&self, participant: &Participant) -> Result<(), DbError> {
        let inserted = self.db.participants().insert(participant).await?;
        if inserted {
            info!(
                id = participant.id,
                handle = %participant.handle,
                role = ?participant.role,
                "Participant registered"
            );
        } else {
            debug!(id = participant.id, "Duplicate registration ignored");
        }
        Ok(())
    }

    /// All ids carrying the given role, in stable (id) order.
    pub async fn list_ids(&self, role: Role) -> Result<Vec<ParticipantId>, DbError> {
        self.db.participants().list_ids(role).await
    }

    /// Total number of registered participants.
    pub async fn count(&self) -> Result<i64, DbError> {
        self.db.participants().count().await
    }
}
