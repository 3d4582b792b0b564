//! # Local media storage
//!
//! Filesystem implementation of `MediaStorage`.
//! Content-addressable: the same photo uploaded twice for a record is stored once.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use domains::ports::MediaStorage;
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::error::StorageError;

pub struct LocalMediaStorage {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/media")
    url_prefix: String,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root_path: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Generates a sharded key: "route/ab/cd/abcd...hash.ext"
    fn sharded_key(route_id: &str, hash: &str, extension: &str) -> String {
        format!("{route_id}/{}/{}/{hash}.{extension}", &hash[0..2], &hash[2..4])
    }
}

/// File extension for a stored image.
fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/heic" => "heic",
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.first().copied())
            .unwrap_or("bin"),
    }
}

/// Route ids become directory names, so only plain segments are accepted.
fn check_route_id(route_id: &str) -> Result<(), StorageError> {
    let plain = !route_id.is_empty()
        && route_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if plain {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(route_id.to_string()))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    /// Saves an upload using its SHA-256 hash as the filename.
    async fn save(&self, route_id: &str, data: Bytes, content_type: &str) -> anyhow::Result<String> {
        check_route_id(route_id)?;

        let hash = hex::encode(Sha256::digest(&data));
        let key = Self::sharded_key(route_id, &hash, extension_for(content_type));
        let target_path = self.root_path.join(&key);

        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).await.map_err(StorageError::from)?;
        }

        if fs::try_exists(&target_path).await.map_err(StorageError::from)? {
            tracing::debug!(%key, "image already stored");
        } else {
            fs::write(&target_path, &data).await.map_err(StorageError::from)?;
            tracing::debug!(%key, bytes = data.len(), "image written");
        }

        Ok(key)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), key)
    }
}
