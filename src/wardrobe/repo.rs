use anyhow::Context;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::dto::{CreateItemRequest, SearchQuery, Statistics, UpdateItemRequest};
use super::repo_types::{TypeCount, WardrobeItem};

const COLUMNS: &str = r#"
    id, user_id, name, garment_type, size, season, style, color, brand, image_url,
    classification_results, teachable_results, created_at, updated_at
"#;

pub async fn create_item(
    db: &PgPool,
    user_id: Uuid,
    req: &CreateItemRequest,
) -> anyhow::Result<WardrobeItem> {
    let item = sqlx::query_as::<_, WardrobeItem>(&format!(
        r#"
        INSERT INTO wardrobe_items (
            id, user_id, name, garment_type, size, season, style, color, brand, image_url,
            classification_results, teachable_results
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&req.name)
    .bind(req.garment_type.as_str())
    .bind(&req.size)
    .bind(req.season.map(|s| s.as_str()))
    .bind(req.style.map(|s| s.as_str()))
    .bind(&req.color)
    .bind(&req.brand)
    .bind(&req.image_url)
    .bind(req.classification_results.as_ref().map(Json))
    .bind(req.teachable_results.as_ref().map(Json))
    .fetch_one(db)
    .await
    .context("insert wardrobe item")?;
    Ok(item)
}

pub async fn list_items(
    db: &PgPool,
    user_id: Uuid,
    skip: i64,
    limit: i64,
) -> anyhow::Result<Vec<WardrobeItem>> {
    let rows = sqlx::query_as::<_, WardrobeItem>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM wardrobe_items
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
    .context("list wardrobe items")?;
    Ok(rows)
}

pub async fn get_item(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<WardrobeItem>> {
    let row = sqlx::query_as::<_, WardrobeItem>(&format!(
        "SELECT {COLUMNS} FROM wardrobe_items WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get wardrobe item")?;
    Ok(row)
}

/// `None` when the item does not exist for this user.
pub async fn update_item(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    req: &UpdateItemRequest,
) -> anyhow::Result<Option<WardrobeItem>> {
    let row = sqlx::query_as::<_, WardrobeItem>(&format!(
        r#"
        UPDATE wardrobe_items SET
            name = COALESCE($3, name),
            garment_type = COALESCE($4, garment_type),
            size = COALESCE($5, size),
            season = COALESCE($6, season),
            style = COALESCE($7, style),
            color = COALESCE($8, color),
            brand = COALESCE($9, brand),
            image_url = COALESCE($10, image_url),
            classification_results = COALESCE($11, classification_results),
            teachable_results = COALESCE($12, teachable_results),
            updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .bind(&req.name)
    .bind(req.garment_type.map(|g| g.as_str()))
    .bind(&req.size)
    .bind(req.season.map(|s| s.as_str()))
    .bind(req.style.map(|s| s.as_str()))
    .bind(&req.color)
    .bind(&req.brand)
    .bind(&req.image_url)
    .bind(req.classification_results.as_ref().map(Json))
    .bind(req.teachable_results.as_ref().map(Json))
    .fetch_optional(db)
    .await
    .context("update wardrobe item")?;
    Ok(row)
}

pub async fn delete_item(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM wardrobe_items WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete wardrobe item")?;
    Ok(res.rows_affected() > 0)
}

/// Exact match on type and style, case-insensitive substring on colour.
pub async fn search_items(
    db: &PgPool,
    user_id: Uuid,
    q: &SearchQuery,
    skip: i64,
    limit: i64,
) -> anyhow::Result<Vec<WardrobeItem>> {
    let color = q
        .color
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let rows = sqlx::query_as::<_, WardrobeItem>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM wardrobe_items
         WHERE user_id = $1
           AND ($2::text IS NULL OR garment_type = $2)
           AND ($3::text IS NULL OR style = $3)
           AND ($4::text IS NULL OR POSITION(LOWER($4) IN LOWER(color)) > 0)
         ORDER BY created_at DESC
         LIMIT $5 OFFSET $6
        "#
    ))
    .bind(user_id)
    .bind(q.garment_type.map(|g| g.as_str()))
    .bind(q.style.map(|s| s.as_str()))
    .bind(color)
    .bind(limit)
    .bind(skip)
    .fetch_all(db)
    .await
    .context("search wardrobe items")?;
    Ok(rows)
}

pub async fn statistics(db: &PgPool, user_id: Uuid) -> anyhow::Result<Statistics> {
    let by_type = sqlx::query_as::<_, TypeCount>(
        r#"
        SELECT garment_type, COUNT(*) AS count
          FROM wardrobe_items
         WHERE user_id = $1
         GROUP BY garment_type
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("count wardrobe items by type")?;

    let (total_sessions, completed_sessions): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COUNT(result_image_url)
          FROM tryon_sessions
         WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await
    .context("count try-on sessions")?;

    Ok(summarize(by_type, total_sessions, completed_sessions))
}

fn summarize(by_type: Vec<TypeCount>, total_sessions: i64, completed_sessions: i64) -> Statistics {
    let total = by_type.iter().map(|t| t.count).sum();
    Statistics {
        wardrobe_items_by_type: by_type
            .into_iter()
            .map(|t| (t.garment_type, t.count))
            .collect(),
        total_wardrobe_items: total,
        total_tryon_sessions: total_sessions,
        completed_tryon_sessions: completed_sessions,
    }
}
