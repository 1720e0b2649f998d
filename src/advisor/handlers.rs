use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};
use uuid::Uuid;

use super::dto::{AdvisorRequest, AdvisorResponse, DeletedResponse, Pagination, UploadResponse};
use super::error::AdvisorError;
use super::repo;
use super::repo_types::AdviceRecord;
use super::services::analyze_outfit;
use crate::auth::tokens::AuthUser;
use crate::images::services::{upload_image, UploadItem};
use crate::state::AppState;
use crate::storage::folders;

pub fn advisor_routes() -> Router<AppState> {
    Router::new()
        .route("/outfit-advisor", get(list_advice))
        .route("/outfit-advisor/analyze", post(analyze))
        .route(
            "/outfit-advisor/upload",
            post(upload).layer(DefaultBodyLimit::max(20 * 1024 * 1024)),
        )
        .route(
            "/outfit-advisor/:id",
            get(get_advice).delete(delete_advice),
        )
}

#[instrument(skip(state, payload))]
pub async fn analyze(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<AdvisorRequest>, JsonRejection>,
) -> Result<Json<AdvisorResponse>, AdvisorError> {
    let Json(req) = payload.map_err(|e| {
        warn!(error = %e, "rejected advisor payload");
        AdvisorError::InvalidRequest(e.body_text())
    })?;
    let resp = analyze_outfit(&state, user_id, req).await?;
    Ok(Json(resp))
}

/// Saved verdicts; storage errors read as an empty history.
#[instrument(skip(state))]
pub async fn list_advice(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Json<Vec<AdviceRecord>> {
    match repo::list_by_user(&state.db, user_id, p.skip.max(0), p.limit.clamp(1, 1000)).await {
        Ok(rows) => Json(rows),
        Err(e) => {
            error!(error = %e, %user_id, "list outfit advice failed");
            Json(Vec::new())
        }
    }
}

#[instrument(skip(state))]
pub async fn get_advice(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AdviceRecord>, (StatusCode, String)> {
    match repo::get_by_id(&state.db, user_id, id).await {
        Ok(Some(rec)) => Ok(Json(rec)),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Not found".into())),
        Err(e) => {
            error!(error = %e, %user_id, %id, "get outfit advice failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_advice(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, (StatusCode, String)> {
    match repo::delete_by_id(&state.db, user_id, id).await {
        Ok(true) => Ok(Json(DeletedResponse {
            success: true,
            message: "Deleted".into(),
        })),
        Ok(false) => Err((StatusCode::NOT_FOUND, "Not found".into())),
        Err(e) => {
            error!(error = %e, %user_id, %id, "delete outfit advice failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// POST /outfit-advisor/upload (multipart `file`)
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

        let image_url = upload_image(
            &state,
            folders::OUTFIT_ADVISOR,
            user_id,
            "outfit",
            UploadItem {
                body,
                content_type: &content_type,
                file_name: file_name.as_deref(),
            },
        )
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "advisor upload failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Upload failed: {}", e))
        })?;
        return Ok(Json(UploadResponse { image_url }));
    }
    Err((StatusCode::BAD_REQUEST, "file is required".into()))
}
