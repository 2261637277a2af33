use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::debug;

use crate::error::MirrorError;
use crate::mirror::{Filter, MirrorStore};
use crate::models::Booking;

/// Бронь, удалённая локально, но ещё не удалённая на сервере.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PendingDelete {
    pub booking_id: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub last_failed_at: DateTime<Utc>,
}

impl MirrorStore {
    pub async fn bookings_for_event(&self, event_id: &str) -> Result<Vec<Booking>, MirrorError> {
        self.query::<Booking>(&Filter::all().eq("event_id", event_id)).await
    }

    pub async fn bookings_for(&self, event_id: &str, user_id: &str) -> Result<Vec<Booking>, MirrorError> {
        self.query::<Booking>(&Filter::all().eq("event_id", event_id).eq("user_id", user_id)).await
    }

    pub async fn all_bookings(&self) -> Result<Vec<Booking>, MirrorError> {
        self.query::<Booking>(&Filter::all()).await
    }

    // === Удаления, не подтверждённые сервером ===

    pub async fn mark_delete_pending(&self, booking_id: &str, error: &str) -> Result<(), MirrorError> {
        let mut batch = self.begin().await?;
        sqlx::query(
            "INSERT INTO pending_remote_deletes (booking_id, attempts, last_error, last_failed_at)
             VALUES (?, 1, ?, ?)
             ON CONFLICT(booking_id) DO UPDATE SET
                attempts = attempts + 1,
                last_error = excluded.last_error,
                last_failed_at = excluded.last_failed_at",
        )
        .bind(booking_id)
        .bind(error)
        .bind(Utc::now())
        .execute(batch.connection())
        .await?;
        batch.commit().await?;
        debug!("Mirror: remote delete of booking {} marked pending", booking_id);
        Ok(())
    }

    pub async fn pending_deletes(&self) -> Result<Vec<PendingDelete>, MirrorError> {
        Ok(sqlx::query_as::<_, PendingDelete>(
            "SELECT booking_id, attempts, last_error, last_failed_at
             FROM pending_remote_deletes
             ORDER BY rowid",
        )
        .fetch_all(&self.database().pool)
        .await?)
    }

    pub async fn clear_delete_pending(&self, booking_id: &str) -> Result<bool, MirrorError> {
        let mut batch = self.begin().await?;
        let result = sqlx::query("DELETE FROM pending_remote_deletes WHERE booking_id = ?")
            .bind(booking_id)
            .execute(batch.connection())
            .await?;
        batch.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
