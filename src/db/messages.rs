//! Contact message persistence.

use sqlx::PgPool;

use super::models::{ContactMessage, NewContactMessage};

pub async fn insert(pool: &PgPool, new: &NewContactMessage) -> Result<ContactMessage, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO messages (name, email, subject, message, created_at)
        VALUES ($1, $2, $3, $4, now())
        RETURNING id, name, email, subject, message, created_at
        "#,
    )
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.subject)
    .bind(&new.message)
    .fetch_one(pool)
    .await
}
