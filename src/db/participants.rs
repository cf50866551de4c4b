//! Participant repository: the durable directory table.
//!
//! One row per registered user. Rows are written exactly once, at the end
//! of a successful registration dialog, and never deleted by the daemon.

use super::DbError;
use crate::dialog::{ParticipantId, Role};
use sqlx::SqlitePool;

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub handle: String,
    pub display_name: String,
    pub role: Role,
}

/// Repository for directory operations.
pub struct ParticipantRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ParticipantRepository<'a> {
    /// Create a new participant repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a participant record.
    ///
    /// A duplicate id is ignored without touching the existing record;
    /// registration appears to succeed to the registrant either way.
    /// Returns whether a row was actually written.
    pub async fn insert(&self, participant: &Participant) -> Result<bool, DbError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO participants (id, handle, display_name, is_supervisor, registered_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(participant.id)
        .bind(&participant.handle)
        .bind(&participant.display_name)
        .bind(participant.role == Role::Supervisor)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch a participant by id.
    pub async fn get(&self, id: ParticipantId) -> Result<Option<Participant>, DbError> {
        let row = sqlx::query_as::<_, (i64, String, String, bool)>(
            r#"
            SELECT id, handle, display_name, is_supervisor
            FROM participants
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, handle, display_name, is_supervisor)| Participant {
            id,
            handle,
            display_name,
            role: role_from_flag(is_supervisor),
        }))
    }

    /// Fetch the role column for an id, if the record exists.
    pub async fn get_role(&self, id: ParticipantId) -> Result<Option<Role>, DbError> {
        let flag =
            sqlx::query_scalar::<_, bool>("SELECT is_supervisor FROM participants WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(flag.map(role_from_flag))
    }

    /// All ids carrying the given role, ordered by id.
    ///
    /// The ORDER BY makes enumeration order stable within one call, which
    /// is the only ordering the relay dispatcher promises.
    pub async fn list_ids(&self, role: Role) -> Result<Vec<ParticipantId>, DbError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM participants WHERE is_supervisor = ? ORDER BY id",
        )
        .bind(role == Role::Supervisor)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }

    /// Total number of directory records.
    pub async fn count(&self) -> Result<i64, DbError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM participants")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[inline]
fn role_from_flag(is_supervisor: bool) -> Role {
    if is_supervisor {
        Role::Supervisor
    } else {
        Role::Participant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn participant(id: ParticipantId, handle: &str, role: Role) -> Participant {
        Participant {
            id,
            handle: handle.to_string(),
            display_name: format!("User {handle}"),
            role,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(":memory:").await.expect("db");
        let repo = db.participants();

        let ann = participant(1, "ann", Role::Participant);
        assert!(repo.insert(&ann).await.expect("insert"));
        assert_eq!(repo.get(1).await.expect("get"), Some(ann));
        assert_eq!(
            repo.get_role(1).await.expect("role"),
            Some(Role::Participant)
        );
        assert_eq!(repo.get_role(99).await.expect("role"), None);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_a_silent_noop() {
        let db = Database::new(":memory:").await.expect("db");
        let repo = db.participants();

        let first = participant(1, "ann", Role::Participant);
        assert!(repo.insert(&first).await.expect("insert"));

        // Same id with different fields: the original record wins.
        let second = participant(1, "impostor", Role::Supervisor);
        assert!(!repo.insert(&second).await.expect("insert"));

        assert_eq!(repo.count().await.expect("count"), 1);
        assert_eq!(repo.get(1).await.expect("get"), Some(first));
    }

    #[tokio::test]
    async fn test_list_ids_filters_by_role_in_id_order() {
        let db = Database::new(":memory:").await.expect("db");
        let repo = db.participants();

        for (id, role) in [
            (30, Role::Participant),
            (10, Role::Supervisor),
            (20, Role::Participant),
            (40, Role::Supervisor),
        ] {
            repo.insert(&participant(id, &format!("u{id}"), role))
                .await
                .expect("insert");
        }

        assert_eq!(
            repo.list_ids(Role::Supervisor).await.expect("list"),
            vec![10, 40]
        );
        assert_eq!(
            repo.list_ids(Role::Participant).await.expect("list"),
            vec![20, 30]
        );
    }
}
