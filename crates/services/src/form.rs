//! An open create/edit form: the editable record plus its image intake.

use std::time::Instant;

use domains::{Boulder, ImageConverter, Result, UploadEndpoint};
use tokio::sync::Mutex;

use crate::intake::ImageIntake;
use crate::record::BoulderForm;

#[derive(Debug)]
pub struct FormSession {
    form: Mutex<BoulderForm>,
    intake: ImageIntake,
    opened_at: Instant,
}

impl FormSession {
    pub fn new(form: BoulderForm) -> Self {
        let intake = ImageIntake::new(form.image.clone());
        Self {
            form: Mutex::new(form),
            intake,
            opened_at: Instant::now(),
        }
    }

    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }

    pub async fn form(&self) -> BoulderForm {
        self.form.lock().await.clone()
    }

    /// Applies user edits to the form state.
    pub async fn edit(&self, apply: impl FnOnce(&mut BoulderForm)) {
        apply(&mut *self.form.lock().await);
    }

    pub fn intake(&self) -> &ImageIntake {
        &self.intake
    }

    /// Validates, uploads any newly selected image, and returns the record
    /// to persist. On error the form keeps everything the user entered.
    ///
    /// The record is built from the values that passed validation. Edits made
    /// while the upload runs do not reach it; only the resolved image is
    /// written back to the form.
    pub async fn prepare_submission(
        &self,
        converter: &dyn ImageConverter,
        endpoint: &dyn UploadEndpoint,
    ) -> Result<Boulder> {
        let snapshot = self.form().await;
        snapshot.validate()?;

        let image = self
            .intake
            .upload(&snapshot.route_id(), snapshot.image.as_deref(), converter, endpoint)
            .await?;

        self.form.lock().await.image = image.clone();
        let validated = BoulderForm { image, ..snapshot };
        Ok(validated.to_submission())
    }
}
