use anyhow::Context;
use bytes::Bytes;
use uuid::Uuid;

use crate::state::AppState;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

#[derive(Clone)]
pub struct UploadItem<'a> {
    pub body: Bytes,
    pub content_type: &'a str,
    pub file_name: Option<&'a str>,
}

/// Uploads one image under `folder` and returns its public URL.
pub async fn upload_image(
    st: &AppState,
    folder: &str,
    user_id: Uuid,
    label: &str,
    img: UploadItem<'_>,
) -> anyhow::Result<String> {
    anyhow::ensure!(!img.body.is_empty(), "empty image");

    let ext = ext_from_mime(img.content_type).unwrap_or("bin");
    let key = object_key(folder, user_id, label, img.file_name, Uuid::new_v4(), ext);
    st.storage
        .put_object(&key, img.body, img.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(st.storage.public_url(&key))
}

/// Checks an uploaded image before anything is sent upstream.
pub fn validate_image(field: &str, content_type: &str, len: usize) -> Result<(), String> {
    if !ALLOWED_MIME_TYPES.contains(&content_type) {
        return Err(format!(
            "Unsupported file type for {}: {}",
            field, content_type
        ));
    }
    if len > MAX_IMAGE_BYTES {
        return Err(format!("Image exceeds 10MB size limit for {}", field));
    }
    Ok(())
}

fn object_key(
    folder: &str,
    user_id: Uuid,
    label: &str,
    file_name: Option<&str>,
    id: Uuid,
    ext: &str,
) -> String {
    let stem = file_name
        .and_then(|n| n.split('.').next())
        .map(sanitize)
        .filter(|s| !s.is_empty());
    match stem {
        Some(stem) => format!("{}/{}_{}_{}-{}.{}", folder, user_id, label, stem, id, ext),
        None => format!("{}/{}_{}-{}.{}", folder, user_id, label, id, ext),
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/heif" => Some("heif"),
        _ => None,
    }
}
