use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateSessionRequest, TryOnResponse};
use super::generator::InlineImage;
use super::prompt::{self, PromptTags};
use super::repo;
use crate::images::services::{upload_image, UploadItem};
use crate::profile::dto::Gender;
use crate::state::AppState;
use crate::storage::folders;
use crate::wardrobe::dto::{GarmentType, Style};

pub const NO_DESCRIPTION: &str = "No Description available.";

#[derive(Debug, thiserror::Error)]
pub enum TryOnError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("image generation failed: {0:#}")]
    Provider(anyhow::Error),
    #[error("{0:#}")]
    Internal(anyhow::Error),
}

impl IntoResponse for TryOnError {
    fn into_response(self) -> Response {
        let status = match &self {
            TryOnError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            TryOnError::Provider(_) => StatusCode::BAD_GATEWAY,
            TryOnError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

pub struct TryOnInput<'a> {
    pub person: UploadItem<'a>,
    pub cloth: UploadItem<'a>,
    pub instructions: Option<String>,
    pub model_type: Option<String>,
    pub gender: Option<Gender>,
    pub garment_type: Option<GarmentType>,
    pub style: Option<Style>,
}

#[derive(Debug)]
pub struct GeneratedLook {
    pub person_image_url: String,
    pub cloth_image_url: String,
    pub result_image_url: Option<String>,
    pub text: String,
}

/// Uploads the inputs, asks the model for the composite and stores whatever
/// image comes back. Nothing is written to the database here.
#[instrument(skip(st, input))]
pub async fn generate_look(
    st: &AppState,
    user_id: Uuid,
    input: &TryOnInput<'_>,
) -> Result<GeneratedLook, TryOnError> {
    let person_folder = format!("{}/person_images", folders::TRYON);
    let cloth_folder = format!("{}/cloth_images", folders::TRYON);

    let person_image_url = upload_image(st, &person_folder, user_id, "person", input.person.clone())
        .await
        .map_err(TryOnError::Internal)?;
    let cloth_image_url = upload_image(st, &cloth_folder, user_id, "cloth", input.cloth.clone())
        .await
        .map_err(TryOnError::Internal)?;

    let brief = prompt::build(&PromptTags {
        model_type: input.model_type.as_deref().unwrap_or_default(),
        gender: input.gender.map(|g| g.as_str()).unwrap_or_default(),
        garment_type: input.garment_type.map(|g| g.as_str()).unwrap_or_default(),
        style: input.style.map(|s| s.as_str()).unwrap_or_default(),
        instructions: input.instructions.as_deref(),
    });
    let images = [
        InlineImage {
            mime_type: input.person.content_type.to_string(),
            data: input.person.body.clone(),
        },
        InlineImage {
            mime_type: input.cloth.content_type.to_string(),
            data: input.cloth.body.clone(),
        },
    ];

    let generated = st
        .image_gen
        .generate(&brief, &images)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "image generation failed");
            TryOnError::Provider(e)
        })?;

    let result_image_url = match generated.image {
        Some(img) => {
            let result = UploadItem {
                body: img.data,
                content_type: &img.mime_type,
                file_name: None,
            };
            let folder = format!("{}/results", folders::TRYON);
            Some(
                upload_image(st, &folder, user_id, "tryon_result", result)
                    .await
                    .map_err(TryOnError::Internal)?,
            )
        }
        None => {
            warn!(%user_id, "image model returned no image");
            None
        }
    };

    Ok(GeneratedLook {
        person_image_url,
        cloth_image_url,
        result_image_url,
        text: generated.text.unwrap_or_else(|| NO_DESCRIPTION.to_string()),
    })
}

/// Full try-on: generate, then record the session and its result.
pub async fn run_try_on(
    st: &AppState,
    user_id: Uuid,
    input: TryOnInput<'_>,
) -> Result<TryOnResponse, TryOnError> {
    let look = generate_look(st, user_id, &input).await?;

    let session = repo::create_session(
        &st.db,
        user_id,
        &CreateSessionRequest {
            person_image_url: look.person_image_url,
            cloth_image_url: look.cloth_image_url,
            instructions: input.instructions,
            model_type: input.model_type,
            gender: input.gender,
            garment_type: input.garment_type,
            style: input.style,
        },
    )
    .await
    .map_err(TryOnError::Internal)?;

    if let Some(url) = &look.result_image_url {
        repo::set_result(&st.db, user_id, session.id, url)
            .await
            .map_err(TryOnError::Internal)?;
    }
    info!(%user_id, session_id = %session.id, has_image = look.result_image_url.is_some(), "try-on completed");

    Ok(TryOnResponse {
        image: look.result_image_url,
        text: look.text,
        session_id: session.id,
    })
}
