#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::{Guest, RosterStats};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashSet;

/// Repository trait for Guest entity operations
///
/// Covers both the door-side lookups (prefix, exact CI, check-in) and the
/// organizer-side roster maintenance.
pub trait GuestRepository: Send + Sync {
    /// Find a guest by ID
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Guest>>;

    /// Guests of an event whose CI starts with `prefix`, CI ascending
    async fn find_by_prefix(
        &self,
        event_id: i64,
        prefix: &str,
        limit: i64,
    ) -> StorageResult<Vec<Guest>>;

    /// Guest of an event with exactly this CI
    ///
    /// When the same CI was registered twice, the lowest ID wins.
    async fn find_by_exact_ci(&self, event_id: i64, ci: &str) -> StorageResult<Option<Guest>>;

    /// Set the check-in timestamp and return the persisted record
    async fn mark_checked_in(&self, guest_id: i64, at: DateTime<Utc>) -> StorageResult<Guest>;

    /// Create a new guest, returning its ID
    async fn create(&self, guest: &Guest) -> StorageResult<i64>;

    /// Delete a guest by ID
    async fn delete(&self, id: i64) -> StorageResult<()>;

    /// All guests of an event, newest first
    async fn list_by_event(&self, event_id: i64) -> StorageResult<Vec<Guest>>;

    /// Whether the CI is already registered for the event
    async fn exists_by_ci(&self, event_id: i64, ci: &str) -> StorageResult<bool>;

    /// Every CI registered for the event
    async fn existing_cis(&self, event_id: i64) -> StorageResult<HashSet<String>>;

    /// Total and checked-in counts for the event
    async fn stats(&self, event_id: i64) -> StorageResult<RosterStats>;
}

/// SQLite implementation of GuestRepository
#[derive(Debug, Clone)]
pub struct SqliteGuestRepository {
    pool: SqlitePool,
}

impl SqliteGuestRepository {
    /// Create a new SQLite guest repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl GuestRepository for SqliteGuestRepository {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Guest>> {
        let guest = sqlx::query_as::<_, Guest>(
            r#"
            SELECT id, event_id, first_name, last_name, ci, checked_in_at, created_at
            FROM guests
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(guest)
    }

    async fn find_by_prefix(
        &self,
        event_id: i64,
        prefix: &str,
        limit: i64,
    ) -> StorageResult<Vec<Guest>> {
        // Compared literally: `_` and `%` in the prefix match themselves
        let guests = sqlx::query_as::<_, Guest>(
            r#"
            SELECT id, event_id, first_name, last_name, ci, checked_in_at, created_at
            FROM guests
            WHERE event_id = ?1 AND substr(ci, 1, length(?2)) = ?2
            ORDER BY ci ASC, id ASC
            LIMIT ?3
            "#,
        )
        .bind(event_id)
        .bind(prefix)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(guests)
    }

    async fn find_by_exact_ci(&self, event_id: i64, ci: &str) -> StorageResult<Option<Guest>> {
        let guest = sqlx::query_as::<_, Guest>(
            r#"
            SELECT id, event_id, first_name, last_name, ci, checked_in_at, created_at
            FROM guests
            WHERE event_id = ? AND ci = ?
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(event_id)
        .bind(ci)
        .fetch_optional(&self.pool)
        .await?;

        Ok(guest)
    }

    async fn mark_checked_in(&self, guest_id: i64, at: DateTime<Utc>) -> StorageResult<Guest> {
        let guest = sqlx::query_as::<_, Guest>(
            r#"
            UPDATE guests
            SET checked_in_at = ?
            WHERE id = ?
            RETURNING id, event_id, first_name, last_name, ci, checked_in_at, created_at
            "#,
        )
        .bind(at)
        .bind(guest_id)
        .fetch_optional(&self.pool)
        .await?;

        guest.ok_or_else(|| StorageError::not_found("Guest", "id", guest_id))
    }

    async fn create(&self, guest: &Guest) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO guests (event_id, first_name, last_name, ci, checked_in_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(guest.event_id)
        .bind(&guest.first_name)
        .bind(&guest.last_name)
        .bind(&guest.ci)
        .bind(guest.checked_in_at)
        .bind(guest.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM guests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Guest", "id", id));
        }

        Ok(())
    }

    async fn list_by_event(&self, event_id: i64) -> StorageResult<Vec<Guest>> {
        let guests = sqlx::query_as::<_, Guest>(
            r#"
            SELECT id, event_id, first_name, last_name, ci, checked_in_at, created_at
            FROM guests
            WHERE event_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(guests)
    }

    async fn exists_by_ci(&self, event_id: i64, ci: &str) -> StorageResult<bool> {
        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM guests WHERE event_id = ? AND ci = ?")
                .bind(event_id)
                .bind(ci)
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0 > 0)
    }

    async fn existing_cis(&self, event_id: i64) -> StorageResult<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT ci FROM guests WHERE event_id = ?")
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(ci,)| ci).collect())
    }

    async fn stats(&self, event_id: i64) -> StorageResult<RosterStats> {
        let (total, entered): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(checked_in_at)
            FROM guests
            WHERE event_id = ?
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(RosterStats::new(total, entered))
    }
}
