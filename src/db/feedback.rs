use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Feedback;

pub async fn create(
    pool: &PgPool,
    request_id: Uuid,
    author_id: Uuid,
    rating: i16,
    comment: &str,
) -> Result<Feedback, sqlx::Error> {
    sqlx::query_as::<_, Feedback>(
        "INSERT INTO feedback (id, request_id, author_id, rating, comment)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(request_id)
    .bind(author_id)
    .bind(rating)
    .bind(comment)
    .fetch_one(pool)
    .await
}

pub async fn find_by_request(pool: &PgPool, request_id: Uuid) -> Result<Option<Feedback>, sqlx::Error> {
    sqlx::query_as::<_, Feedback>("SELECT * FROM feedback WHERE request_id = $1")
        .bind(request_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Feedback>, sqlx::Error> {
    sqlx::query_as::<_, Feedback>("SELECT * FROM feedback ORDER BY created_at DESC, id DESC")
        .fetch_all(pool)
        .await
}

/// Returns false if nothing was deleted.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM feedback WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
