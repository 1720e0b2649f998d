use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TryOnSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub person_image_url: String,
    pub cloth_image_url: String,
    pub result_image_url: Option<String>,
    pub instructions: Option<String>,
    pub model_type: Option<String>,
    pub gender: Option<String>,
    pub garment_type: Option<String>,
    pub style: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}
