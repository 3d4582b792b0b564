//! # api-adapters
//!
//! HTTP surface of the boulder catalogue: server-rendered pages for the
//! listing and the create/edit form, the image upload endpoint, and a client
//! for upload endpoints hosted elsewhere.

pub mod http_upload;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod form_input;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod router;
#[cfg(feature = "web-axum")]
pub mod state;
#[cfg(feature = "web-axum")]
pub mod views;

pub use http_upload::HttpUploadEndpoint;

#[cfg(feature = "web-axum")]
pub use router::build_router;
#[cfg(feature = "web-axum")]
pub use state::{AppState, FormLimits};
