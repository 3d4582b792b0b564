//! # Domain Models
//!
//! These structs represent the core entities of the boulder catalogue.
//! Identifiers are UUIDs assigned by the store; a record without one is a draft.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored shape of the `style` column.
///
/// The store keeps the tag list as JSON text, while freshly edited records
/// carry the decoded list. Both arrive through the same field, so the wire
/// form accepts either and [`crate::style::decode`] normalizes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Text(String),
    Tags(Vec<String>),
}

/// A single boulder problem in a sector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Boulder {
    /// Absent until the store has persisted the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub grade: Option<String>,
    /// Expected in `0..=100`; the model stores whatever it is given.
    pub quality: Option<i32>,
    /// Conventionally the literal `"boulder"`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub image: Option<String>,
    /// Produced by an external tool; never written by this system.
    pub image_line: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// One of `lowball`, `regular`, `highball` when set.
    pub height: Option<String>,
    pub style: Option<StyleValue>,
    pub top: Option<bool>,
    pub sector_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Boulder {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Both coordinates, or nothing.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// An image file picked in the edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub file_name: String,
    /// Declared MIME type, as reported by the browser.
    pub content_type: String,
    pub data: Bytes,
}

impl SelectedImage {
    pub const HEIC_MIME: &'static str = "image/heic";

    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// HEIC photos cannot be previewed or stored as-is and must be
    /// re-encoded as JPEG first.
    pub fn requires_conversion(&self) -> bool {
        self.content_type.eq_ignore_ascii_case(Self::HEIC_MIME)
            || self.file_name.to_lowercase().ends_with(".heic")
    }
}

/// Body of the image upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// A `data:<mime>;base64,<payload>` URL.
    pub image_data: String,
    /// Owning record id, or `"new"` for a draft.
    pub route_id: String,
    pub image_format: String,
}

/// Reply of the image upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResponse {
    pub fn stored(url: impl Into<String>) -> Self {
        Self {
            success: true,
            url: Some(url.into()),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            url: None,
            error: Some(error.into()),
        }
    }
}
