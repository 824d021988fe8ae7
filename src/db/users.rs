use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Role, User};

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub nif: Option<&'a str>,
    pub birth_date: Option<NaiveDate>,
    pub role: Role,
    pub service_categories: &'a [String],
}

/// Profile fields a user can change on themselves. `None` leaves a column as is.
#[derive(Default)]
pub struct ProfileChanges<'a> {
    pub name: Option<&'a str>,
    pub nif: Option<&'a str>,
    pub birth_date: Option<NaiveDate>,
    pub avatar_url: Option<&'a str>,
    pub service_categories: Option<&'a [String]>,
    pub password_hash: Option<&'a str>,
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    new: &NewUser<'_>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (id, email, password_hash, name, nif, birth_date, role, service_categories)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.name)
    .bind(new.nif)
    .bind(new.birth_date)
    .bind(new.role)
    .bind(new.service_categories)
    .fetch_one(executor)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC, id DESC")
        .fetch_all(pool)
        .await
}

pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    changes: &ProfileChanges<'_>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET
             name = COALESCE($2, name),
             nif = COALESCE($3, nif),
             birth_date = COALESCE($4, birth_date),
             avatar_url = COALESCE($5, avatar_url),
             service_categories = COALESCE($6, service_categories),
             password_hash = COALESCE($7, password_hash),
             updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(changes.name)
    .bind(changes.nif)
    .bind(changes.birth_date)
    .bind(changes.avatar_url)
    .bind(changes.service_categories)
    .bind(changes.password_hash)
    .fetch_one(pool)
    .await
}

pub async fn update_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Admin-side change of role and/or offered categories.
///
/// A user who stops being a technician is released from pending and
/// in-progress jobs in the same transaction; finished jobs keep their
/// technician.
pub async fn update_role(
    pool: &PgPool,
    id: Uuid,
    role: Option<Role>,
    service_categories: Option<&[String]>,
) -> Result<User, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET
             role = COALESCE($2, role),
             service_categories = COALESCE($3, service_categories),
             updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(role)
    .bind(service_categories)
    .fetch_one(&mut *tx)
    .await?;

    if !user.is_technician() {
        sqlx::query(
            "UPDATE maintenance_requests
             SET technician_id = NULL, status = 'pending', updated_at = now()
             WHERE technician_id = $1 AND status IN ('pending', 'in_progress')",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(user)
}

/// Delete a user and everything they own in one transaction.
///
/// Requests they were working on are released back to the pool instead of
/// being deleted.
pub async fn delete_cascade(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE maintenance_requests
         SET technician_id = NULL,
             status = CASE WHEN status = 'in_progress' THEN 'pending'::request_status ELSE status END,
             updated_at = now()
         WHERE technician_id = $1",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "DELETE FROM messages
         WHERE sender_id = $1
            OR request_id IN (SELECT id FROM maintenance_requests WHERE client_id = $1)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "DELETE FROM feedback
         WHERE author_id = $1
            OR request_id IN (SELECT id FROM maintenance_requests WHERE client_id = $1)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM maintenance_requests WHERE client_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}
