//! Image intake for one form: selection, preview, conversion and upload.
//!
//! ```text
//! Empty -> Selected -> (Converting) -> Encoding -> Uploading -> Resolved
//!                            \______________\___________\-----> Failed
//! ```
//!
//! At most one upload runs per intake. A submit that arrives while one is in
//! flight is rejected with [`DomainError::UploadInProgress`], never queued.

use std::sync::atomic::{AtomicBool, Ordering};

use domains::{DomainError, ImageConverter, Result, SelectedImage, UploadEndpoint, UploadRequest};
use tokio::sync::Mutex;

use crate::upload::encode_data_url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeState {
    Empty,
    Selected,
    Converting,
    Encoding,
    Uploading,
    /// Public URL of the stored image.
    Resolved(String),
    /// Reason shown next to the file input. The selection is kept.
    Failed(String),
}

#[derive(Debug)]
struct Inner {
    state: IntakeState,
    selection: Option<SelectedImage>,
    /// Bumped on every selection so a late preview cannot land on a newer file.
    generation: u64,
    preview: Option<String>,
}

/// Per-form holder of the selected image.
#[derive(Debug)]
pub struct ImageIntake {
    inner: Mutex<Inner>,
    uploading: AtomicBool,
}

/// Holds the single upload slot; released on drop whatever the outcome.
struct UploadGate<'a>(&'a AtomicBool);

impl<'a> UploadGate<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| UploadGate(flag))
            .map_err(|_| DomainError::UploadInProgress)
    }
}

impl Drop for UploadGate<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ImageIntake {
    /// `existing_image` is what the preview shows until a file is picked.
    pub fn new(existing_image: Option<String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: IntakeState::Empty,
                selection: None,
                generation: 0,
                preview: existing_image,
            }),
            uploading: AtomicBool::new(false),
        }
    }

    /// Records the file and builds its preview.
    ///
    /// HEIC files get no preview. For other files the preview is produced on
    /// the blocking pool; if that fails the preview stays empty and the
    /// selection is still submitted.
    pub async fn select(&self, image: SelectedImage) {
        let generation = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            inner.selection = Some(image.clone());
            inner.state = IntakeState::Selected;
            inner.preview = None;
            inner.generation
        };

        if image.requires_conversion() {
            tracing::debug!(file = %image.file_name, "HEIC selected, preview suppressed");
            return;
        }

        let file_name = image.file_name.clone();
        match tokio::task::spawn_blocking(move || preview_data_url(&image)).await {
            Ok(Ok(preview)) => {
                let mut inner = self.inner.lock().await;
                if inner.generation == generation {
                    inner.preview = Some(preview);
                }
            }
            Ok(Err(err)) => {
                tracing::warn!(file = %file_name, %err, "no preview for selected image");
            }
            Err(err) => {
                tracing::warn!(file = %file_name, %err, "preview task failed");
            }
        }
    }

    pub async fn state(&self) -> IntakeState {
        self.inner.lock().await.state.clone()
    }

    pub async fn preview(&self) -> Option<String> {
        self.inner.lock().await.preview.clone()
    }

    pub async fn selection(&self) -> Option<SelectedImage> {
        self.inner.lock().await.selection.clone()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::Acquire)
    }

    /// Uploads the selected image and returns the URL the record should carry.
    ///
    /// With nothing selected this returns `existing_image` untouched. An
    /// already resolved selection returns its URL without uploading again.
    pub async fn upload(
        &self,
        route_id: &str,
        existing_image: Option<&str>,
        converter: &dyn ImageConverter,
        endpoint: &dyn UploadEndpoint,
    ) -> Result<Option<String>> {
        let (selected, generation) = {
            let inner = self.inner.lock().await;
            match (&inner.selection, &inner.state) {
                (None, _) => return Ok(existing_image.map(str::to_owned)),
                (Some(_), IntakeState::Resolved(url)) => return Ok(Some(url.clone())),
                (Some(selected), _) => (selected.clone(), inner.generation),
            }
        };

        let _gate = UploadGate::acquire(&self.uploading)?;

        let image = if selected.requires_conversion() {
            self.transition(generation, IntakeState::Converting).await;
            match converter.to_jpeg(&selected).await {
                Ok(converted) => converted,
                Err(err) => {
                    let reason = format!("{err:#}");
                    tracing::error!(file = %selected.file_name, error = %reason, "HEIC conversion failed");
                    self.transition(
                        generation,
                        IntakeState::Failed(
                            "Failed to convert HEIC image. Please try a different format.".into(),
                        ),
                    )
                    .await;
                    return Err(DomainError::Conversion(reason));
                }
            }
        } else {
            selected
        };

        self.transition(generation, IntakeState::Encoding).await;
        let request = UploadRequest {
            image_data: encode_data_url(&image.content_type, &image.data),
            route_id: route_id.to_string(),
            image_format: image.content_type.clone(),
        };

        self.transition(generation, IntakeState::Uploading).await;
        let response = match endpoint.submit(&request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(route_id, error = %format!("{err:#}"), "image upload transport failed");
                let reason = "could not reach the image upload endpoint".to_string();
                self.transition(generation, IntakeState::Failed(reason.clone())).await;
                return Err(DomainError::Upload(reason));
            }
        };

        match (response.success, response.url) {
            (true, Some(url)) => {
                tracing::info!(route_id, %url, "image uploaded");
                self.transition(generation, IntakeState::Resolved(url.clone())).await;
                Ok(Some(url))
            }
            (success, _) => {
                let reason = response.error.unwrap_or_else(|| {
                    if success {
                        "upload endpoint returned no url".to_string()
                    } else {
                        "Failed to upload image".to_string()
                    }
                });
                tracing::error!(route_id, error = %reason, "image upload rejected");
                self.transition(generation, IntakeState::Failed(reason.clone())).await;
                Err(DomainError::Upload(reason))
            }
        }
    }

    /// Moves the state machine unless a newer file was selected meanwhile.
    async fn transition(&self, generation: u64, state: IntakeState) {
        let mut inner = self.inner.lock().await;
        if inner.generation == generation {
            inner.state = state;
        }
    }
}

fn preview_data_url(image: &SelectedImage) -> image::ImageResult<String> {
    let format = image::guess_format(&image.data)?;
    let content_type = if image.content_type.is_empty() {
        format.to_mime_type()
    } else {
        image.content_type.as_str()
    };
    Ok(encode_data_url(content_type, &image.data))
}
