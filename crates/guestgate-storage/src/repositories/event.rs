#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::Event;
use sqlx::SqlitePool;

/// Repository trait for Event entity operations
///
/// # Implementation Note
///
/// This trait uses native async trait methods (Edition 2024 feature),
/// eliminating the need for the async-trait crate.
pub trait EventRepository: Send + Sync {
    /// Find an event by its public door code
    async fn find_by_code(&self, code: &str) -> StorageResult<Option<Event>>;

    /// Find an event by ID
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Event>>;

    /// Create a new event, returning its ID
    ///
    /// Fails with [`StorageError::Duplicate`] when the event code is taken.
    async fn create(&self, event: &Event) -> StorageResult<i64>;

    /// Update name, date and PIN fingerprint of an existing event
    async fn update(&self, event: &Event) -> StorageResult<()>;

    /// List all events, newest first
    async fn list_all(&self) -> StorageResult<Vec<Event>>;
}

/// SQLite implementation of EventRepository
#[derive(Debug, Clone)]
pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    /// Create a new SQLite event repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl EventRepository for SqliteEventRepository {
    async fn find_by_code(&self, code: &str) -> StorageResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, name, event_date, event_code, door_pin_hash, created_at
            FROM events
            WHERE event_code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, name, event_date, event_code, door_pin_hash, created_at
            FROM events
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn create(&self, event: &Event) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO events (name, event_date, event_code, door_pin_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.name)
        .bind(event.event_date)
        .bind(&event.event_code)
        .bind(&event.door_pin_hash)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StorageError::Duplicate(format!("event code {}", event.event_code))
            }
            other => StorageError::Database(other),
        })?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, event: &Event) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET name = ?, event_date = ?, door_pin_hash = ?,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            "#,
        )
        .bind(&event.name)
        .bind(event.event_date)
        .bind(&event.door_pin_hash)
        .bind(event.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Event", "id", event.id));
        }

        Ok(())
    }

    async fn list_all(&self) -> StorageResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, name, event_date, event_code, door_pin_hash, created_at
            FROM events
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use chrono::{NaiveDate, Utc};
    use guestgate_core::fingerprint;

    async fn setup_test_db() -> Database {
        Database::in_memory().await.unwrap()
    }

    fn create_test_event(code: &str) -> Event {
        Event {
            id: 0,
            name: "Fiesta".to_string(),
            event_date: NaiveDate::from_ymd_opt(2025, 12, 31),
            event_code: code.to_string(),
            door_pin_hash: fingerprint("4821").into_inner(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_code() {
        let db = setup_test_db().await;
        let repo = SqliteEventRepository::new(db.pool().clone());

        let id = repo.create(&create_test_event("AB12CD")).await.unwrap();
        assert!(id > 0);

        let found = repo.find_by_code("AB12CD").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.name, "Fiesta");
        assert_eq!(found.event_date, NaiveDate::from_ymd_opt(2025, 12, 31));
        assert_eq!(found.pin_fingerprint(), fingerprint("4821"));
    }

    #[tokio::test]
    async fn test_find_by_code_missing() {
        let db = setup_test_db().await;
        let repo = SqliteEventRepository::new(db.pool().clone());

        assert!(repo.find_by_code("NOPE42").await.unwrap().is_none());
        assert!(repo.find_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = setup_test_db().await;
        let repo = SqliteEventRepository::new(db.pool().clone());

        repo.create(&create_test_event("AB12CD")).await.unwrap();
        let result = repo.create(&create_test_event("AB12CD")).await;

        assert!(matches!(result, Err(StorageError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_update_replaces_fingerprint() {
        let db = setup_test_db().await;
        let repo = SqliteEventRepository::new(db.pool().clone());

        let id = repo.create(&create_test_event("AB12CD")).await.unwrap();
        let mut event = repo.find_by_id(id).await.unwrap().unwrap();
        event.name = "Fiesta II".to_string();
        event.event_date = None;
        event.door_pin_hash = fingerprint("9999").into_inner();
        repo.update(&event).await.unwrap();

        let updated = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(updated.name, "Fiesta II");
        assert_eq!(updated.event_date, None);
        assert_eq!(updated.pin_fingerprint(), fingerprint("9999"));
        assert_eq!(updated.event_code, "AB12CD");
    }

    #[tokio::test]
    async fn test_update_missing_event() {
        let db = setup_test_db().await;
        let repo = SqliteEventRepository::new(db.pool().clone());

        let mut event = create_test_event("AB12CD");
        event.id = 42;
        let result = repo.update(&event).await;

        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let db = setup_test_db().await;
        let repo = SqliteEventRepository::new(db.pool().clone());

        let mut older = create_test_event("OLD111");
        older.created_at = Utc::now() - chrono::Duration::days(1);
        repo.create(&older).await.unwrap();
        repo.create(&create_test_event("NEW222")).await.unwrap();

        let events = repo.list_all().await.unwrap();
        let codes: Vec<_> = events.iter().map(|e| e.event_code.as_str()).collect();
        assert_eq!(codes, vec!["NEW222", "OLD111"]);
    }
}
