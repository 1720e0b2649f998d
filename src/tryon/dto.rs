use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::profile::dto::Gender;
use crate::wardrobe::dto::{GarmentType, Style};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub person_image_url: String,
    pub cloth_image_url: String,
    pub instructions: Option<String>,
    pub model_type: Option<String>,
    pub gender: Option<Gender>,
    pub garment_type: Option<GarmentType>,
    pub style: Option<Style>,
}

#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    pub result_image_url: String,
}

#[derive(Debug, Serialize)]
pub struct TryOnResponse {
    pub image: Option<String>,
    pub text: String,
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}
fn default_limit() -> i64 {
    100
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub message: String,
}
