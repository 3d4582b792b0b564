//! Fixtures shared by the integration tests: a fully wired catalogue over
//! in-memory SQLite and a temporary media directory.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::Request;
use domains::{ImageConverter, MediaStorage};
use http_body_util::BodyExt;
use services::{BoulderSynchronizer, CatalogSettings, StorageUploadEndpoint};
use storage_adapters::{LocalMediaStorage, RasterJpegConverter, SqliteBoulderRepository};
use tempfile::TempDir;
use uuid::Uuid;

pub const SECTOR_ID: &str = "5f08920b-ff8b-45ed-b3f8-a4976bdd71b7";
pub const MEDIA_PREFIX: &str = "/media";
pub const BOUNDARY: &str = "catalog-boundary";

/// Eight bytes are enough for format sniffing.
pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

pub fn settings() -> CatalogSettings {
    CatalogSettings {
        default_sector_id: Uuid::parse_str(SECTOR_ID).unwrap(),
    }
}

/// Store and media directory, without the web layer.
pub struct TestBackend {
    pub repo: Arc<SqliteBoulderRepository>,
    pub storage: Arc<LocalMediaStorage>,
    pub media: TempDir,
}

pub async fn backend() -> TestBackend {
    let repo = SqliteBoulderRepository::connect("sqlite::memory:")
        .await
        .unwrap();
    let media = tempfile::tempdir().unwrap();
    let storage = LocalMediaStorage::new(media.path(), MEDIA_PREFIX);
    TestBackend {
        repo: Arc::new(repo),
        storage: Arc::new(storage),
        media,
    }
}

#[cfg(feature = "web-axum")]
pub use web::*;

#[cfg(feature = "web-axum")]
mod web {
    use api_adapters::{build_router, AppState};
    use axum::Router;

    use super::*;

    pub struct TestCatalog {
        pub router: Router,
        pub state: AppState,
        pub backend: TestBackend,
    }

    /// Uploads go through the in-process endpoint, as in the default binary.
    pub async fn build_test_app() -> TestCatalog {
        build_test_app_with(Arc::new(RasterJpegConverter)).await
    }

    pub async fn build_test_app_with(converter: Arc<dyn ImageConverter>) -> TestCatalog {
        let backend = backend().await;
        let storage: Arc<dyn MediaStorage> = backend.storage.clone();
        let upload_service = Arc::new(StorageUploadEndpoint::new(storage));
        let catalog = Arc::new(BoulderSynchronizer::new(backend.repo.clone()));

        let state = AppState::new(
            catalog,
            converter,
            upload_service.clone(),
            upload_service,
            settings(),
        );
        let router = build_router(state.clone(), backend.media.path(), MEDIA_PREFIX);

        TestCatalog {
            router,
            state,
            backend,
        }
    }

    impl TestCatalog {
        /// Token of the single open form.
        pub fn open_form(&self) -> Uuid {
            assert_eq!(self.state.forms.len(), 1, "expected exactly one open form");
            *self.state.forms.iter().next().unwrap().key()
        }
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// A multipart form submission with an optional `image` file part.
pub fn submit_form(token: Uuid, fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    if let Some((file_name, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(format!("/boulders/form/{token}"))
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_text(response: axum::response::Response) -> String {
    String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
}
