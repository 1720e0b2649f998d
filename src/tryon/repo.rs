use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::CreateSessionRequest;
use super::repo_types::TryOnSession;

const COLUMNS: &str = r#"
    id, user_id, person_image_url, cloth_image_url, result_image_url, instructions,
    model_type, gender, garment_type, style, created_at, completed_at
"#;

pub async fn create_session(
    db: &PgPool,
    user_id: Uuid,
    req: &CreateSessionRequest,
) -> anyhow::Result<TryOnSession> {
    let row = sqlx::query_as::<_, TryOnSession>(&format!(
        r#"
        INSERT INTO tryon_sessions (
            id, user_id, person_image_url, cloth_image_url, instructions,
            model_type, gender, garment_type, style
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&req.person_image_url)
    .bind(&req.cloth_image_url)
    .bind(&req.instructions)
    .bind(&req.model_type)
    .bind(req.gender.map(|g| g.as_str()))
    .bind(req.garment_type.map(|g| g.as_str()))
    .bind(req.style.map(|s| s.as_str()))
    .fetch_one(db)
    .await
    .context("insert try-on session")?;
    Ok(row)
}

pub async fn list_sessions(
    db: &PgPool,
    user_id: Uuid,
    skip: i64,
    limit: i64,
) -> anyhow::Result<Vec<TryOnSession>> {
    let rows = sqlx::query_as::<_, TryOnSession>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM tryon_sessions
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .bind(skip)
    .fetch_all(db)
    .await
    .context("list try-on sessions")?;
    Ok(rows)
}

pub async fn get_session(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> anyhow::Result<Option<TryOnSession>> {
    let row = sqlx::query_as::<_, TryOnSession>(&format!(
        "SELECT {COLUMNS} FROM tryon_sessions WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get try-on session")?;
    Ok(row)
}

/// Marks the session completed with the given result image.
pub async fn set_result(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    result_image_url: &str,
) -> anyhow::Result<Option<TryOnSession>> {
    let row = sqlx::query_as::<_, TryOnSession>(&format!(
        r#"
        UPDATE tryon_sessions
           SET result_image_url = $3, completed_at = now()
         WHERE id = $1 AND user_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .bind(result_image_url)
    .fetch_optional(db)
    .await
    .context("update try-on result")?;
    Ok(row)
}

pub async fn delete_session(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM tryon_sessions WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete try-on session")?;
    Ok(res.rows_affected() > 0)
}
