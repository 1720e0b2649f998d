use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Stored advisor run: the request inputs next to the normalised verdict.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdviceRecord {
    pub id: Uuid,
    pub user_id: Uuid,

    pub description: Option<String>,
    pub outfit_name: Option<String>,
    pub outfit_type: Option<String>,
    pub outfit_size: Option<String>,
    pub outfit_season: Option<String>,
    pub outfit_style: Option<String>,
    pub image_url: Option<String>,

    pub suitability_score: Option<i32>,
    pub recommendation: Option<String>,
    pub explanation: Option<String>,
    pub improvement_suggestions: Option<String>,
    pub better_outfit_idea: Option<String>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
