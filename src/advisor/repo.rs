use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::{AdvisorRequest, AdvisorResult};
use super::repo_types::AdviceRecord;

const COLUMNS: &str = r#"
    id, user_id, description, outfit_name, outfit_type, outfit_size, outfit_season,
    outfit_style, image_url, suitability_score, recommendation, explanation,
    improvement_suggestions, better_outfit_idea, created_at, updated_at
"#;

pub async fn insert_advice(
    db: &PgPool,
    user_id: Uuid,
    req: &AdvisorRequest,
    result: &AdvisorResult,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO outfit_advice (
            id, user_id, description, outfit_name, outfit_type, outfit_size, outfit_season,
            outfit_style, image_url, suitability_score, recommendation, explanation,
            improvement_suggestions, better_outfit_idea
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&req.description)
    .bind(&req.outfit_name)
    .bind(&req.outfit_type)
    .bind(&req.outfit_size)
    .bind(&req.outfit_season)
    .bind(&req.outfit_style)
    .bind(&req.image_url)
    .bind(result.suitability_score)
    .bind(&result.recommendation)
    .bind(&result.explanation)
    .bind(&result.improvement_suggestions)
    .bind(&result.better_outfit_idea)
    .fetch_one(db)
    .await
    .context("insert outfit advice")?;
    Ok(id)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    skip: i64,
    limit: i64,
) -> anyhow::Result<Vec<AdviceRecord>> {
    let rows = sqlx::query_as::<_, AdviceRecord>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM outfit_advice
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
    .context("list outfit advice")?;
    Ok(rows)
}

pub async fn get_by_id(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> anyhow::Result<Option<AdviceRecord>> {
    let row = sqlx::query_as::<_, AdviceRecord>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM outfit_advice
         WHERE id = $1 AND user_id = $2
        "#
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get outfit advice")?;
    Ok(row)
}

/// Returns whether a row was removed.
pub async fn delete_by_id(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM outfit_advice WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete outfit advice")?;
    Ok(res.rows_affected() > 0)
}
