//! The image upload endpoint, served in-process over a [`MediaStorage`].

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use domains::{MediaStorage, UploadEndpoint, UploadRequest, UploadResponse};
use uuid::Uuid;

use crate::record::DRAFT_ROUTE_ID;

/// `data:<mime>;base64,<payload>`
pub fn encode_data_url(content_type: &str, data: &[u8]) -> String {
    format!("data:{content_type};base64,{}", STANDARD.encode(data))
}

/// Splits a base64 data URL into its declared MIME type and bytes.
pub fn parse_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let content_type = header.strip_suffix(";base64")?;
    let data = STANDARD.decode(payload.trim()).ok()?;
    Some((content_type.to_string(), data))
}

/// Stores uploaded boulder photos and answers with their public URL.
pub struct StorageUploadEndpoint {
    storage: Arc<dyn MediaStorage>,
}

impl StorageUploadEndpoint {
    pub fn new(storage: Arc<dyn MediaStorage>) -> Self {
        Self { storage }
    }

    /// Every outcome is a response; storage failures become `success: false`.
    pub async fn handle(&self, request: &UploadRequest) -> UploadResponse {
        if request.route_id != DRAFT_ROUTE_ID && Uuid::parse_str(&request.route_id).is_err() {
            return UploadResponse::rejected("Invalid route id");
        }

        let is_image = request
            .image_format
            .parse::<mime::Mime>()
            .map(|m| m.type_() == mime::IMAGE)
            .unwrap_or(false);
        if !is_image {
            return UploadResponse::rejected(format!(
                "Unsupported image format: {}",
                request.image_format
            ));
        }

        let data = match parse_data_url(&request.image_data) {
            Some((_, data)) if !data.is_empty() => data,
            _ => return UploadResponse::rejected("Invalid image data"),
        };

        let size = data.len();
        match self
            .storage
            .save(&request.route_id, Bytes::from(data), &request.image_format)
            .await
        {
            Ok(key) => {
                tracing::info!(route_id = %request.route_id, %key, size, "image stored");
                UploadResponse::stored(self.storage.public_url(&key))
            }
            Err(err) => {
                tracing::error!(route_id = %request.route_id, error = %format!("{err:#}"), "failed to store image");
                UploadResponse::rejected("Failed to upload image")
            }
        }
    }
}

#[async_trait]
impl UploadEndpoint for StorageUploadEndpoint {
    async fn submit(&self, request: &UploadRequest) -> anyhow::Result<UploadResponse> {
        Ok(self.handle(request).await)
    }
}
