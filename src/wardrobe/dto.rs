use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GarmentType {
    Shirt,
    Tshirt,
    Pants,
    Dress,
    Skirt,
    Jacket,
    Coat,
    Saree,
    Churidar,
    Other,
}

impl GarmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GarmentType::Shirt => "shirt",
            GarmentType::Tshirt => "tshirt",
            GarmentType::Pants => "pants",
            GarmentType::Dress => "dress",
            GarmentType::Skirt => "skirt",
            GarmentType::Jacket => "jacket",
            GarmentType::Coat => "coat",
            GarmentType::Saree => "saree",
            GarmentType::Churidar => "churidar",
            GarmentType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Casual,
    Ethnic,
    Formal,
    Party,
}

impl Style {
    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Casual => "casual",
            Style::Ethnic => "ethnic",
            Style::Formal => "formal",
            Style::Party => "party",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Summer,
    Winter,
    Rainy,
    All,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Summer => "summer",
            Season::Winter => "winter",
            Season::Rainy => "rainy",
            Season::All => "all",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub garment_type: GarmentType,
    pub size: Option<String>,
    pub season: Option<Season>,
    pub style: Option<Style>,
    pub color: Option<String>,
    pub brand: Option<String>,
    pub image_url: String,
    pub classification_results: Option<Vec<Value>>,
    pub teachable_results: Option<Vec<Value>>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub garment_type: Option<GarmentType>,
    pub size: Option<String>,
    pub season: Option<Season>,
    pub style: Option<Style>,
    pub color: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub classification_results: Option<Vec<Value>>,
    pub teachable_results: Option<Vec<Value>>,
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

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub garment_type: Option<GarmentType>,
    pub style: Option<Style>,
    pub color: Option<String>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Prediction {
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: String,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub results: Vec<Prediction>,
    pub image_url: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Statistics {
    pub wardrobe_items_by_type: BTreeMap<String, i64>,
    pub total_wardrobe_items: i64,
    pub total_tryon_sessions: i64,
    pub completed_tryon_sessions: i64,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub message: String,
}
