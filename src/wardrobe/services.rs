use anyhow::Context;
use tracing::{info, instrument};
use uuid::Uuid;

use super::classifier::top_predictions;
use super::dto::ClassifyResponse;
use crate::images::services::{upload_image, UploadItem};
use crate::state::AppState;
use crate::storage::folders;

/// Stores the photo in the wardrobe folder, then asks the classifier what it is.
#[instrument(skip(st, img))]
pub async fn classify_upload(
    st: &AppState,
    user_id: Uuid,
    img: UploadItem<'_>,
) -> anyhow::Result<ClassifyResponse> {
    let bytes = img.body.clone();
    let image_url = upload_image(st, folders::WARDROBE_ITEMS, user_id, "item", img).await?;

    let raw = st
        .classifier
        .classify(&bytes)
        .await
        .context("classify wardrobe image")?;
    let results = top_predictions(raw);
    info!(%user_id, predictions = results.len(), "wardrobe image classified");

    Ok(ClassifyResponse { results, image_url })
}
