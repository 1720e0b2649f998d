use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// Body of both `PUT` and `POST /profile`. Missing names and preferences
/// are stored as empty; missing gender and age keep what is stored.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i32>,
    pub style_preferences: Option<Vec<String>>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ProfileResponse {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub style_preferences: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ProfileResponse {
    /// What a user without a stored profile sees.
    pub fn empty(email: String) -> Self {
        Self {
            email,
            first_name: String::new(),
            last_name: String::new(),
            gender: None,
            age: None,
            style_preferences: Vec::new(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }
}
