use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WardrobeItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub garment_type: String,
    pub size: Option<String>,
    pub season: Option<String>,
    pub style: Option<String>,
    pub color: Option<String>,
    pub brand: Option<String>,
    pub image_url: String,
    pub classification_results: Option<Value>, // jsonb array
    pub teachable_results: Option<Value>,      // jsonb array
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct TypeCount {
    pub garment_type: String,
    pub count: i64,
}
