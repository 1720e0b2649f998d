use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outfit details submitted for critique. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdvisorRequest {
    pub description: Option<String>,
    pub outfit_name: Option<String>,
    pub outfit_type: Option<String>,
    pub outfit_size: Option<String>,
    pub outfit_season: Option<String>,
    pub outfit_style: Option<String>,
    pub image_url: Option<String>,
}

/// Normalised model verdict; any field may be null.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdvisorResult {
    pub suitability_score: Option<i32>,
    pub recommendation: Option<String>,
    pub explanation: Option<String>,
    pub improvement_suggestions: Option<String>,
    pub better_outfit_idea: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdvisorResponse {
    #[serde(flatten)]
    pub result: AdvisorResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}
fn default_limit() -> i64 {
    50
}
