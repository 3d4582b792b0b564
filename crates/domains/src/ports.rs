//! # Ports
//!
//! Any adapter must implement these traits to be wired into the binary.
//! Adapter failures travel as `anyhow::Error`; the services layer maps them
//! onto [`crate::DomainError`] at the operation boundary.

use async_trait::async_trait;
use bytes::Bytes;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::models::{Boulder, SelectedImage, UploadRequest, UploadResponse};

/// Persistence contract for the `boulder` table.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait BoulderRepository: Send + Sync {
    /// Every boulder, ordered by name ascending.
    async fn list_ordered_by_name(&self) -> anyhow::Result<Vec<Boulder>>;

    /// Inserts a draft; the store assigns `id` and timestamps.
    async fn insert(&self, draft: &Boulder) -> anyhow::Result<()>;

    /// Replaces every column of the row matching `boulder.id`.
    async fn update(&self, boulder: &Boulder) -> anyhow::Result<()>;
}

/// Re-encodes photos the catalogue cannot store as-is.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ImageConverter: Send + Sync {
    /// Converts to JPEG at maximum quality.
    async fn to_jpeg(&self, image: &SelectedImage) -> anyhow::Result<SelectedImage>;
}

/// The image upload endpoint, local or remote.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait UploadEndpoint: Send + Sync {
    /// `Err` means the endpoint could not be reached; a rejection arrives as
    /// `Ok` with `success: false`.
    async fn submit(&self, request: &UploadRequest) -> anyhow::Result<UploadResponse>;
}

/// Media storage contract for uploaded boulder photos.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Saves raw bytes under the owning record and returns a storage key.
    async fn save(&self, route_id: &str, data: Bytes, content_type: &str) -> anyhow::Result<String>;

    /// Returns the public URL for a storage key.
    fn public_url(&self, key: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn adapter_failures_keep_their_context() {
        let mut repo = MockBoulderRepository::new();
        repo.expect_list_ordered_by_name().returning(|| {
            Err(anyhow::anyhow!("connection refused").context("listing boulders"))
        });

        let err = repo.list_ordered_by_name().await.unwrap_err();
        assert_eq!(format!("{err:#}"), "listing boulders: connection refused");
    }
}
