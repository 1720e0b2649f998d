use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateSessionRequest, DeletedResponse, Pagination, ResultQuery, TryOnResponse};
use super::repo;
use super::repo_types::TryOnSession;
use super::services::{run_try_on, TryOnError, TryOnInput};
use crate::auth::tokens::AuthUser;
use crate::images::services::{validate_image, UploadItem};
use crate::state::AppState;

pub fn tryon_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/try-on",
            post(try_on).layer(DefaultBodyLimit::max(25 * 1024 * 1024)),
        )
        .route("/try-on/sessions", post(create_session).get(list_sessions))
        .route(
            "/try-on/sessions/:id",
            get(get_session).delete(delete_session),
        )
        .route("/try-on/sessions/:id/result", put(set_result))
}

struct FilePart {
    body: Bytes,
    content_type: String,
    file_name: Option<String>,
}

impl FilePart {
    fn as_upload(&self) -> UploadItem<'_> {
        UploadItem {
            body: self.body.clone(),
            content_type: &self.content_type,
            file_name: self.file_name.as_deref(),
        }
    }
}

#[derive(Default)]
struct TryOnForm {
    person_image: Option<FilePart>,
    cloth_image: Option<FilePart>,
    instructions: Option<String>,
    model_type: Option<String>,
    gender: Option<String>,
    garment_type: Option<String>,
    style: Option<String>,
}

async fn read_form(mut mp: Multipart) -> Result<TryOnForm, TryOnError> {
    let bad = |e: axum::extract::multipart::MultipartError| TryOnError::InvalidInput(e.to_string());
    let mut form = TryOnForm::default();
    while let Some(field) = mp.next_field().await.map_err(bad)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "person_image" | "cloth_image" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = field.bytes().await.map_err(bad)?;
                let part = Some(FilePart {
                    body,
                    content_type,
                    file_name,
                });
                if name == "person_image" {
                    form.person_image = part;
                } else {
                    form.cloth_image = part;
                }
            }
            "instructions" | "model_type" | "gender" | "garment_type" | "style" => {
                let text = field.text().await.map_err(bad)?;
                let slot = match name.as_str() {
                    "instructions" => &mut form.instructions,
                    "model_type" => &mut form.model_type,
                    "gender" => &mut form.gender,
                    "garment_type" => &mut form.garment_type,
                    _ => &mut form.style,
                };
                *slot = Some(text);
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Blank means "not given"; anything else must be a known lowercase value.
fn parse_tag<T: DeserializeOwned>(field: &str, raw: Option<&str>) -> Result<Option<T>, TryOnError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    serde_json::from_value(Value::String(raw.to_lowercase()))
        .map(Some)
        .map_err(|_| TryOnError::InvalidInput(format!("Invalid {}: {}", field, raw)))
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn required<'a>(field: &str, part: &'a Option<FilePart>) -> Result<&'a FilePart, TryOnError> {
    let part = part
        .as_ref()
        .ok_or_else(|| TryOnError::InvalidInput(format!("{} is required", field)))?;
    validate_image(field, &part.content_type, part.body.len()).map_err(TryOnError::InvalidInput)?;
    Ok(part)
}

/// POST /try-on (multipart `person_image`, `cloth_image` and optional tags)
#[instrument(skip(state, mp))]
pub async fn try_on(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Multipart,
) -> Result<Json<TryOnResponse>, TryOnError> {
    let form = read_form(mp).await?;

    let reject = |e: TryOnError| {
        warn!(%user_id, error = %e, "rejected try-on input");
        e
    };
    let person = required("person_image", &form.person_image).map_err(reject)?;
    let cloth = required("cloth_image", &form.cloth_image).map_err(reject)?;

    let input = TryOnInput {
        person: person.as_upload(),
        cloth: cloth.as_upload(),
        gender: parse_tag("gender", form.gender.as_deref())?,
        garment_type: parse_tag("garment_type", form.garment_type.as_deref())?,
        style: parse_tag("style", form.style.as_deref())?,
        instructions: non_blank(form.instructions.clone()),
        model_type: non_blank(form.model_type.clone()),
    };

    let resp = run_try_on(&state, user_id, input).await?;
    Ok(Json(resp))
}

fn internal(what: &str, e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "{} failed", what);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to {}: {}", what, e),
    )
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Try-on session not found".into())
}

#[instrument(skip(state, req))]
pub async fn create_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<TryOnSession>), (StatusCode, String)> {
    let session = repo::create_session(&state.db, user_id, &req)
        .await
        .map_err(|e| internal("create try-on session", e))?;
    info!(%user_id, session_id = %session.id, "try-on session created");
    Ok((StatusCode::CREATED, Json(session)))
}

#[instrument(skip(state))]
pub async fn list_sessions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<TryOnSession>>, (StatusCode, String)> {
    let rows = repo::list_sessions(&state.db, user_id, p.skip.max(0), p.limit.clamp(1, 1000))
        .await
        .map_err(|e| internal("get try-on sessions", e))?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TryOnSession>, (StatusCode, String)> {
    repo::get_session(&state.db, user_id, id)
        .await
        .map_err(|e| internal("get try-on session", e))?
        .map(Json)
        .ok_or_else(not_found)
}

/// PUT /try-on/sessions/:id/result?result_image_url=...
#[instrument(skip(state))]
pub async fn set_result(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Query(q): Query<ResultQuery>,
) -> Result<Json<TryOnSession>, (StatusCode, String)> {
    repo::set_result(&state.db, user_id, id, &q.result_image_url)
        .await
        .map_err(|e| internal("update try-on session", e))?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip(state))]
pub async fn delete_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, (StatusCode, String)> {
    let removed = repo::delete_session(&state.db, user_id, id)
        .await
        .map_err(|e| internal("delete try-on session", e))?;
    if !removed {
        return Err(not_found());
    }
    Ok(Json(DeletedResponse {
        success: true,
        message: "Try-on session deleted successfully".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tokens::{TokenKeys, TokenUse};
    use crate::profile::dto::Gender;
    use crate::tryon::generator::{Generated, ImageGenerator, InlineImage};
    use crate::wardrobe::dto::GarmentType;
    use async_trait::async_trait;
    use axum::{body::Body, extract::FromRef, http::Request};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl ImageGenerator for Counting {
        async fn generate(&self, _p: &str, _i: &[InlineImage]) -> anyhow::Result<Generated> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Generated::default())
        }
    }

    const BOUNDARY: &str = "X-TRYON-BOUNDARY";

    fn file(name: &str, ct: &str, data: &[u8]) -> Vec<u8> {
        let mut out = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{name}.bin\"\r\nContent-Type: {ct}\r\n\r\n"
        )
        .into_bytes();
        out.extend_from_slice(data);
        out.extend_from_slice(b"\r\n");
        out
    }

    fn text(name: &str, value: &str) -> Vec<u8> {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
        .into_bytes()
    }

    fn request(state: &AppState, parts: Vec<Vec<u8>>) -> Request<Body> {
        let mut body: Vec<u8> = parts.concat();
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        let token = TokenKeys::from_ref(state)
            .issue(Uuid::new_v4(), TokenUse::Access)
            .unwrap();
        Request::post("/try-on")
            .header("authorization", format!("Bearer {}", token))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn status_and_body(state: &AppState, parts: Vec<Vec<u8>>) -> (StatusCode, String) {
        let res = tryon_routes()
            .with_state(state.clone())
            .oneshot(request(state, parts))
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn rejects_bad_inputs_before_calling_the_model() {
        let gen = Arc::new(Counting::default());
        let state = AppState::fake().with_image_generator(gen.clone());

        let (status, body) = status_and_body(
            &state,
            vec![
                file("person_image", "image/gif", b"gif"),
                file("cloth_image", "image/png", b"png"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Unsupported file type for person_image: image/gif");

        let (status, body) =
            status_and_body(&state, vec![file("person_image", "image/png", b"png")]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "cloth_image is required");

        let (status, body) = status_and_body(
            &state,
            vec![
                file("person_image", "image/png", b"png"),
                file("cloth_image", "image/webp", b"webp"),
                text("garment_type", "poncho"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Invalid garment_type: poncho");

        assert_eq!(gen.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn tags_parse_case_insensitively_and_blank_is_none() {
        let g: Option<GarmentType> = parse_tag("garment_type", Some(" Saree ")).unwrap();
        assert_eq!(g, Some(GarmentType::Saree));
        let g: Option<Gender> = parse_tag("gender", Some("")).unwrap();
        assert_eq!(g, None);
        let g: Option<Gender> = parse_tag("gender", None).unwrap();
        assert_eq!(g, None);
        assert!(parse_tag::<Gender>("gender", Some("robot")).is_err());
    }

    #[test]
    fn blank_text_fields_are_dropped() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" studio ".into())).as_deref(), Some("studio"));
    }
}
