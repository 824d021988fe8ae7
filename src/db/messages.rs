use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Message;

pub async fn create(
    pool: &PgPool,
    request_id: Uuid,
    sender_id: Uuid,
    content: &str,
    attachments: &[String],
) -> Result<Message, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        "INSERT INTO messages (id, request_id, sender_id, content, attachments)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(request_id)
    .bind(sender_id)
    .bind(content)
    .bind(attachments)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Thread of a request, oldest first.
pub async fn list_by_request(pool: &PgPool, request_id: Uuid) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE request_id = $1 ORDER BY created_at ASC, id ASC",
    )
    .bind(request_id)
    .fetch_all(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM messages WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
