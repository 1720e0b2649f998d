use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{error, info, instrument};

use super::dto::{ProfileRequest, ProfileResponse};
use super::repo;
use crate::auth::{repo_types::User, tokens::AuthUser};
use crate::state::AppState;

pub fn profile_routes() -> Router<AppState> {
    Router::new().route(
        "/profile",
        get(get_profile).put(save_profile).post(save_profile),
    )
}

/// Users without a stored profile get an empty one.
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let fail = |e: anyhow::Error| {
        error!(error = %e, %user_id, "get profile failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to get profile: {}", e),
        )
    };

    if let Some(profile) = repo::get_profile(&state.db, user_id).await.map_err(fail)? {
        return Ok(Json(profile));
    }
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(fail)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;
    Ok(Json(ProfileResponse::empty(user.email)))
}

#[instrument(skip(state, req))]
pub async fn save_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let profile = repo::upsert_profile(&state.db, user_id, &req)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "save profile failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to update profile: {}", e),
            )
        })?;
    info!(%user_id, "profile saved");
    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::dto::Gender;

    #[test]
    fn empty_profile_serializes_with_blank_fields() {
        let json = serde_json::to_value(ProfileResponse::empty("ada@closet.io".into())).unwrap();
        assert_eq!(json["email"], "ada@closet.io");
        assert_eq!(json["first_name"], "");
        assert!(json["gender"].is_null());
        assert_eq!(json["style_preferences"], serde_json::json!([]));
        assert!(json["updated_at"].is_string());
    }

    #[test]
    fn request_accepts_partial_bodies_and_lowercase_gender() {
        let req: ProfileRequest =
            serde_json::from_str(r#"{"gender":"female","style_preferences":["ethnic"]}"#).unwrap();
        assert_eq!(req.gender, Some(Gender::Female));
        assert!(req.first_name.is_none());
        assert_eq!(req.style_preferences.unwrap(), vec!["ethnic".to_string()]);

        assert!(serde_json::from_str::<ProfileRequest>(r#"{"gender":"robot"}"#).is_err());
    }
}
