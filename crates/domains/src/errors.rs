//! # DomainError
//!
//! Centralized error handling for the boulder catalogue.
//! Every failure a use case can surface to the presentation layer is one of these.

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Stored `style` text that is not a JSON array of strings.
    #[error("malformed style data: {0}")]
    MalformedStyleData(String),

    /// A HEIC photo could not be re-encoded. The selection is kept.
    #[error("image conversion failed: {0}")]
    Conversion(String),

    /// The upload endpoint rejected the image or could not be reached.
    #[error("image upload failed: {0}")]
    Upload(String),

    /// Listing the catalogue failed.
    #[error("could not fetch boulders: {0}")]
    Fetch(String),

    /// `update` was called on a draft.
    #[error("cannot update a boulder without an identifier")]
    MissingIdentifier,

    /// The store rejected an insert or update.
    #[error("could not save boulder: {0}")]
    Persist(String),

    /// Validation failure (e.g., empty name, unparseable coordinate)
    #[error("validation error: {0}")]
    Validation(String),

    /// A second submit while the form's upload is still running.
    #[error("an image upload is already in progress")]
    UploadInProgress,

    /// Resource not found (e.g., boulder, form session)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),
}

/// A specialized Result type for catalogue logic.
pub type Result<T> = std::result::Result<T, DomainError>;
