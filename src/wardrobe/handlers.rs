use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    ClassifyResponse, CreateItemRequest, DeletedResponse, Pagination, SearchQuery, Statistics,
    UpdateItemRequest,
};
use super::repo;
use super::repo_types::WardrobeItem;
use super::services::classify_upload;
use crate::auth::tokens::AuthUser;
use crate::images::services::{validate_image, UploadItem};
use crate::state::AppState;

pub fn wardrobe_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/wardrobe/classify",
            post(classify).layer(DefaultBodyLimit::max(20 * 1024 * 1024)),
        )
        .route("/wardrobe/items", post(create_item).get(list_items))
        .route(
            "/wardrobe/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/wardrobe/search", get(search_items))
        .route("/wardrobe/statistics", get(statistics))
}

fn internal(what: &str, e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "{} failed", what);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to {}: {}", what, e),
    )
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Wardrobe item not found".into())
}

/// POST /wardrobe/classify (multipart `file`)
#[instrument(skip(state, mp))]
pub async fn classify(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<ClassifyResponse>, (StatusCode, String)> {
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
        validate_image("file", &content_type, body.len()).map_err(|msg| {
            warn!(%user_id, %msg, "rejected wardrobe image");
            (StatusCode::BAD_REQUEST, msg)
        })?;

        let resp = classify_upload(
            &state,
            user_id,
            UploadItem {
                body,
                content_type: &content_type,
                file_name: file_name.as_deref(),
            },
        )
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "classification failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Classification failed: {}", e),
            )
        })?;
        return Ok(Json(resp));
    }
    Err((StatusCode::BAD_REQUEST, "file is required".into()))
}

#[instrument(skip(state, req))]
pub async fn create_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<WardrobeItem>), (StatusCode, String)> {
    let item = repo::create_item(&state.db, user_id, &req)
        .await
        .map_err(|e| internal("create wardrobe item", e))?;
    info!(%user_id, item_id = %item.id, "wardrobe item created");
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<WardrobeItem>>, (StatusCode, String)> {
    let rows = repo::list_items(&state.db, user_id, p.skip.max(0), p.limit.clamp(1, 1000))
        .await
        .map_err(|e| internal("get wardrobe items", e))?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<WardrobeItem>, (StatusCode, String)> {
    repo::get_item(&state.db, user_id, id)
        .await
        .map_err(|e| internal("get wardrobe item", e))?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip(state, req))]
pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<WardrobeItem>, (StatusCode, String)> {
    repo::update_item(&state.db, user_id, id, &req)
        .await
        .map_err(|e| internal("update wardrobe item", e))?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, (StatusCode, String)> {
    let removed = repo::delete_item(&state.db, user_id, id)
        .await
        .map_err(|e| internal("delete wardrobe item", e))?;
    if !removed {
        return Err(not_found());
    }
    Ok(Json(DeletedResponse {
        success: true,
        message: "Wardrobe item deleted successfully".into(),
    }))
}

#[instrument(skip(state))]
pub async fn search_items(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<WardrobeItem>>, (StatusCode, String)> {
    let rows = repo::search_items(&state.db, user_id, &q, q.skip.max(0), q.limit.clamp(1, 1000))
        .await
        .map_err(|e| internal("search wardrobe items", e))?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn statistics(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Statistics>, (StatusCode, String)> {
    let stats = repo::statistics(&state.db, user_id)
        .await
        .map_err(|e| internal("get statistics", e))?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tokens::{TokenKeys, TokenUse};
    use crate::wardrobe::classifier::Classifier;
    use async_trait::async_trait;
    use axum::{body::Body, extract::FromRef, http::Request};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Fixed;

    #[async_trait]
    impl Classifier for Fixed {
        async fn classify(&self, _image: &[u8]) -> anyhow::Result<Vec<(String, f64)>> {
            Ok(vec![("Saree".into(), 0.93)])
        }
    }

    const BOUNDARY: &str = "X-WARDROBE-BOUNDARY";

    fn multipart(field: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"look.png\"\r\nContent-Type: {ct}\r\n\r\n",
            b = BOUNDARY,
            f = field,
            ct = content_type
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn classify_request(state: &AppState, body: Vec<u8>) -> Request<Body> {
        let token = TokenKeys::from_ref(state)
            .issue(Uuid::new_v4(), TokenUse::Access)
            .unwrap();
        Request::post("/wardrobe/classify")
            .header("authorization", format!("Bearer {}", token))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn classify_returns_predictions_and_url() {
        let state = AppState::fake().with_classifier(Arc::new(Fixed));
        let app = wardrobe_routes().with_state(state.clone());
        let res = app
            .oneshot(classify_request(&state, multipart("file", "image/png", b"\x89PNG")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["results"][0]["class"], "Saree");
        assert_eq!(json["results"][0]["confidence"], "93%");
        assert!(json["image_url"]
            .as_str()
            .unwrap()
            .starts_with("https://fake.local/virtual_wardrobe/wardrobe_item_images/"));
    }

    #[tokio::test]
    async fn classify_rejects_non_images_and_missing_file() {
        let state = AppState::fake().with_classifier(Arc::new(Fixed));
        let app = wardrobe_routes().with_state(state.clone());

        let res = app
            .clone()
            .oneshot(classify_request(&state, multipart("file", "text/plain", b"hi")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app
            .oneshot(classify_request(&state, multipart("other", "image/png", b"\x89PNG")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn routes_require_auth() {
        let app = wardrobe_routes().with_state(AppState::fake());
        let res = app
            .oneshot(Request::get("/wardrobe/items").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
