use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::{ProfileRequest, ProfileResponse};

pub async fn get_profile(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<ProfileResponse>> {
    let row = sqlx::query_as::<_, ProfileResponse>(
        r#"
        SELECT u.email, p.first_name, p.last_name, p.gender, p.age,
               p.style_preferences, p.updated_at
          FROM profiles p
          JOIN users u ON u.id = p.user_id
         WHERE p.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get profile")?;
    Ok(row)
}

pub async fn upsert_profile(
    db: &PgPool,
    user_id: Uuid,
    req: &ProfileRequest,
) -> anyhow::Result<ProfileResponse> {
    let row = sqlx::query_as::<_, ProfileResponse>(
        r#"
        WITH saved AS (
            INSERT INTO profiles (user_id, first_name, last_name, gender, age, style_preferences)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                gender = COALESCE(EXCLUDED.gender, profiles.gender),
                age = COALESCE(EXCLUDED.age, profiles.age),
                style_preferences = EXCLUDED.style_preferences,
                updated_at = now()
            RETURNING user_id, first_name, last_name, gender, age, style_preferences, updated_at
        )
        SELECT u.email, s.first_name, s.last_name, s.gender, s.age,
               s.style_preferences, s.updated_at
          FROM saved s
          JOIN users u ON u.id = s.user_id
        "#,
    )
    .bind(user_id)
    .bind(req.first_name.as_deref().unwrap_or_default())
    .bind(req.last_name.as_deref().unwrap_or_default())
    .bind(req.gender.map(|g| g.as_str()))
    .bind(req.age)
    .bind(req.style_preferences.clone().unwrap_or_default())
    .fetch_one(db)
    .await
    .context("upsert profile")?;
    Ok(row)
}
