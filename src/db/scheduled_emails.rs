use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ScheduledEmail;

pub async fn schedule(
    pool: &PgPool,
    recipient: &str,
    subject: &str,
    body: &str,
    send_at: DateTime<Utc>,
) -> Result<ScheduledEmail, sqlx::Error> {
    sqlx::query_as::<_, ScheduledEmail>(
        "INSERT INTO scheduled_emails (id, recipient, subject, body, send_at)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(recipient)
    .bind(subject)
    .bind(body)
    .bind(send_at)
    .fetch_one(pool)
    .await
}

/// Unsent rows whose send time has passed and that have retries left, oldest first.
pub async fn list_due(pool: &PgPool, max_attempts: i32) -> Result<Vec<ScheduledEmail>, sqlx::Error> {
    sqlx::query_as::<_, ScheduledEmail>(
        "SELECT * FROM scheduled_emails
         WHERE sent_at IS NULL AND send_at <= now() AND attempts < $1
         ORDER BY send_at ASC, id ASC",
    )
    .bind(max_attempts)
    .fetch_all(pool)
    .await
}

/// Idempotent: a row already marked sent, or deleted meanwhile, is left alone.
pub async fn mark_sent(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE scheduled_emails SET sent_at = now() WHERE id = $1 AND sent_at IS NULL",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn record_failure(pool: &PgPool, id: Uuid, error: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE scheduled_emails SET attempts = attempts + 1, last_error = $2
         WHERE id = $1 AND sent_at IS NULL",
    )
    .bind(id)
    .bind(error)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ScheduledEmail>, sqlx::Error> {
    sqlx::query_as::<_, ScheduledEmail>("SELECT * FROM scheduled_emails WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}
