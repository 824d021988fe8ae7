use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CompletedRequestSummary, MaintenanceRequest, RequestStatus};

pub struct NewRequest<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub price: f64,
    pub client_id: Uuid,
}

/// Optional filters on request listings.
#[derive(Default)]
pub struct ListFilter<'a> {
    pub category: Option<&'a str>,
    pub status: Option<RequestStatus>,
}

pub async fn create(pool: &PgPool, new: &NewRequest<'_>) -> Result<MaintenanceRequest, sqlx::Error> {
    sqlx::query_as::<_, MaintenanceRequest>(
        "INSERT INTO maintenance_requests (id, title, description, category, price, client_id)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(new.title)
    .bind(new.description)
    .bind(new.category)
    .bind(new.price)
    .bind(new.client_id)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<MaintenanceRequest>, sqlx::Error> {
    sqlx::query_as::<_, MaintenanceRequest>("SELECT * FROM maintenance_requests WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_all(
    pool: &PgPool,
    filter: &ListFilter<'_>,
) -> Result<Vec<MaintenanceRequest>, sqlx::Error> {
    sqlx::query_as::<_, MaintenanceRequest>(
        "SELECT * FROM maintenance_requests
         WHERE ($1::text IS NULL OR category = $1)
           AND ($2::request_status IS NULL OR status = $2)
         ORDER BY created_at DESC, id DESC",
    )
    .bind(filter.category)
    .bind(filter.status)
    .fetch_all(pool)
    .await
}

/// Requests a user filed or is assigned to.
pub async fn list_for_participant(
    pool: &PgPool,
    user_id: Uuid,
    filter: &ListFilter<'_>,
) -> Result<Vec<MaintenanceRequest>, sqlx::Error> {
    sqlx::query_as::<_, MaintenanceRequest>(
        "SELECT * FROM maintenance_requests
         WHERE (client_id = $1 OR technician_id = $1)
           AND ($2::text IS NULL OR category = $2)
           AND ($3::request_status IS NULL OR status = $3)
         ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .bind(filter.category)
    .bind(filter.status)
    .fetch_all(pool)
    .await
}

/// Work a technician can see: open requests in their categories plus their own jobs.
pub async fn list_for_technician(
    pool: &PgPool,
    technician_id: Uuid,
    categories: &[String],
    filter: &ListFilter<'_>,
) -> Result<Vec<MaintenanceRequest>, sqlx::Error> {
    sqlx::query_as::<_, MaintenanceRequest>(
        "SELECT * FROM maintenance_requests
         WHERE (technician_id = $1
                OR (status = 'pending' AND technician_id IS NULL AND category = ANY($2)))
           AND ($3::text IS NULL OR category = $3)
           AND ($4::request_status IS NULL OR status = $4)
         ORDER BY created_at DESC, id DESC",
    )
    .bind(technician_id)
    .bind(categories)
    .bind(filter.category)
    .bind(filter.status)
    .fetch_all(pool)
    .await
}

pub async fn update_content(
    pool: &PgPool,
    id: Uuid,
    title: &str,
    description: &str,
    category: &str,
    price: f64,
) -> Result<MaintenanceRequest, sqlx::Error> {
    sqlx::query_as::<_, MaintenanceRequest>(
        "UPDATE maintenance_requests
         SET title = $2, description = $3, category = $4, price = $5, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(title)
    .bind(description)
    .bind(category)
    .bind(price)
    .fetch_one(pool)
    .await
}

/// Set status and technician together. `completed_at` follows the status and
/// keeps its first value while the request stays completed.
pub async fn update_assignment(
    pool: &PgPool,
    id: Uuid,
    status: RequestStatus,
    technician_id: Option<Uuid>,
) -> Result<MaintenanceRequest, sqlx::Error> {
    sqlx::query_as::<_, MaintenanceRequest>(
        "UPDATE maintenance_requests
         SET status = $2,
             technician_id = $3,
             completed_at = CASE WHEN $2 = 'completed'::request_status
                                 THEN COALESCE(completed_at, now()) ELSE NULL END,
             updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .bind(technician_id)
    .fetch_one(pool)
    .await
}

/// Self-assignment that only succeeds while the request is still open.
pub async fn claim(
    pool: &PgPool,
    id: Uuid,
    technician_id: Uuid,
) -> Result<Option<MaintenanceRequest>, sqlx::Error> {
    sqlx::query_as::<_, MaintenanceRequest>(
        "UPDATE maintenance_requests
         SET status = 'in_progress', technician_id = $2, updated_at = now()
         WHERE id = $1 AND status = 'pending' AND technician_id IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(technician_id)
    .fetch_optional(pool)
    .await
}

/// Delete a request with its messages and feedback in one transaction.
/// Returns false if the request did not exist.
pub async fn delete_cascade(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM messages WHERE request_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM feedback WHERE request_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM maintenance_requests WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(deleted > 0)
}

pub async fn list_completed_with_feedback(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<CompletedRequestSummary>, sqlx::Error> {
    sqlx::query_as::<_, CompletedRequestSummary>(
        "SELECT r.id, r.title, r.category,
                split_part(c.name, ' ', 1) AS client_name,
                split_part(t.name, ' ', 1) AS technician_name,
                f.rating, f.comment, r.created_at, r.completed_at
         FROM maintenance_requests r
         JOIN feedback f ON f.request_id = r.id
         JOIN users c ON c.id = r.client_id
         LEFT JOIN users t ON t.id = r.technician_id
         WHERE r.status = 'completed'
         ORDER BY r.created_at DESC, r.id DESC
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
