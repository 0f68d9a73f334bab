//! Transaction-aware guest writes for bulk roster imports.
//!
//! These functions accept a SQLite transaction reference so that an import
//! either lands completely or not at all.
//!
//! # Usage Pattern
//!
//! ```no_run
//! use guestgate_storage::{Database, DatabaseConfig, transaction};
//! use guestgate_storage::models::Guest;
//! use chrono::Utc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open(DatabaseConfig::new("guestgate.db")).await?;
//! # let guests = vec![Guest {
//! #     id: 0,
//! #     event_id: 1,
//! #     first_name: "Ana".to_string(),
//! #     last_name: "Pérez".to_string(),
//! #     ci: "12345678".to_string(),
//! #     checked_in_at: None,
//! #     created_at: Utc::now(),
//! # }];
//! let mut tx = db.pool().begin().await?;
//! let inserted = transaction::insert_guests(&mut tx, &guests, 500).await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Dropping the transaction without committing rolls every chunk back.

use crate::error::{StorageError, StorageResult};
use crate::models::Guest;
use sqlx::{QueryBuilder, Sqlite, Transaction};
use tracing::debug;

/// Create a single guest within a transaction
///
/// Returns the auto-generated guest ID.
pub async fn create_guest(tx: &mut Transaction<'_, Sqlite>, guest: &Guest) -> StorageResult<i64> {
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
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Insert guests in multi-row statements of at most `chunk_size` rows
///
/// Returns the number of rows inserted.
///
/// # Errors
///
/// Returns [`StorageError::Configuration`] for a zero chunk size, or the
/// database error of the first failing chunk. The caller decides whether to
/// roll back.
pub async fn insert_guests(
    tx: &mut Transaction<'_, Sqlite>,
    guests: &[Guest],
    chunk_size: usize,
) -> StorageResult<u64> {
    if chunk_size == 0 {
        return Err(StorageError::Configuration(
            "import chunk size must be positive".to_string(),
        ));
    }

    let mut inserted = 0;

    for (index, chunk) in guests.chunks(chunk_size).enumerate() {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO guests (event_id, first_name, last_name, ci, checked_in_at, created_at) ",
        );

        builder.push_values(chunk, |mut row, guest| {
            row.push_bind(guest.event_id)
                .push_bind(&guest.first_name)
                .push_bind(&guest.last_name)
                .push_bind(&guest.ci)
                .push_bind(guest.checked_in_at)
                .push_bind(guest.created_at);
        });

        let result = builder.build().execute(&mut **tx).await?;
        inserted += result.rows_affected();

        debug!(chunk = index, rows = chunk.len(), "Inserted guest chunk");
    }

    Ok(inserted)
}
