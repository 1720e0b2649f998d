use anyhow::Context;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use async_trait::async_trait;
use bytes::Bytes;

use crate::config::StorageConfig;

/// Fixed key prefixes, one per upload category.
pub mod folders {
    pub const BASE: &str = "virtual_wardrobe";
    pub const WARDROBE_ITEMS: &str = "virtual_wardrobe/wardrobe_item_images";
    pub const OUTFIT_ADVISOR: &str = "virtual_wardrobe/outfit_advisor_images";
    pub const TRYON: &str = "virtual_wardrobe/tryon_images";
}

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    fn public_url(&self, key: &str) -> String;
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
    public_base: String,
}

impl Storage {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
            public_base: public_base(cfg),
        })
    }
}

fn public_base(cfg: &StorageConfig) -> String {
    match &cfg.public_base_url {
        Some(base) => base.trim_end_matches('/').to_string(),
        None => format!("{}/{}", cfg.endpoint.trim_end_matches('/'), cfg.bucket),
    }
}

#[async_trait]
impl StorageClient for Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(public: Option<&str>) -> StorageConfig {
        StorageConfig {
            endpoint: "https://s3.local/".into(),
            bucket: "closet".into(),
            access_key: "k".into(),
            secret_key: "s".into(),
            region: "us-east-1".into(),
            public_base_url: public.map(str::to_string),
        }
    }

    #[test]
    fn public_base_defaults_to_path_style_bucket_url() {
        assert_eq!(public_base(&cfg(None)), "https://s3.local/closet");
    }

    #[test]
    fn public_base_prefers_cdn_url() {
        assert_eq!(
            public_base(&cfg(Some("https://cdn.example.com/"))),
            "https://cdn.example.com"
        );
    }

    #[test]
    fn folders_are_namespaced() {
        for f in [folders::WARDROBE_ITEMS, folders::OUTFIT_ADVISOR, folders::TRYON] {
            assert!(f.starts_with(folders::BASE));
        }
    }
}
