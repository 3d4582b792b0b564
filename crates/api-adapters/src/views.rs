//! Askama page models.

use askama::Template;
use domains::style::{self, Height};
use services::card::display_quality;
use services::{BoulderCard, FormSession};
use uuid::Uuid;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub cards: Vec<BoulderCard>,
}

/// One `<option>` or checkbox.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "form.html")]
pub struct FormPage {
    pub heading: &'static str,
    pub action: String,
    pub cancel_action: String,
    pub error: Option<String>,
    pub name: String,
    pub description: String,
    pub grade: String,
    pub kind: String,
    pub quality: i32,
    pub top: bool,
    pub latitude: String,
    pub longitude: String,
    pub heights: Vec<Choice>,
    pub styles: Vec<Choice>,
    pub image_preview: Option<String>,
    pub selected_file: Option<String>,
    pub heic_selected: bool,
    pub has_image_line: bool,
    pub uploading: bool,
    pub submit_label: &'static str,
}

impl FormPage {
    /// Snapshot of an open form session, with an optional error banner.
    pub async fn from_session(session_id: Uuid, session: &FormSession, error: Option<String>) -> Self {
        let form = session.form().await;
        let intake = session.intake();
        let selection = intake.selection().await;
        let uploading = intake.is_uploading();

        let heights = Height::ALL
            .iter()
            .map(|height| Choice {
                value: height.as_str().to_string(),
                label: height.form_label().to_string(),
                selected: form.height.as_deref() == Some(height.as_str()),
            })
            .collect();

        let styles = style::STYLE_OPTIONS
            .iter()
            .map(|(value, label)| Choice {
                value: value.to_string(),
                label: label.to_string(),
                selected: form.style.iter().any(|tag| tag == value),
            })
            .collect();

        let image_preview = match intake.preview().await {
            Some(preview) => Some(preview),
            None if selection.is_none() => form.image.clone().filter(|url| !url.is_empty()),
            None => None,
        };

        let submit_label = if uploading {
            "Guardando..."
        } else if form.is_draft() {
            "Crear"
        } else {
            "Guardar Cambios"
        };

        Self {
            heading: if form.is_draft() { "Crear Nuevo Bloque" } else { "Editar Bloque" },
            action: format!("/boulders/form/{session_id}"),
            cancel_action: format!("/boulders/form/{session_id}/cancel"),
            error,
            name: form.name.clone(),
            description: form.description.clone().unwrap_or_default(),
            grade: form.grade.clone().unwrap_or_default(),
            kind: form.kind.clone().unwrap_or_default(),
            quality: display_quality(form.quality),
            top: form.top.unwrap_or(false),
            latitude: form.latitude.map(|v| v.to_string()).unwrap_or_default(),
            longitude: form.longitude.map(|v| v.to_string()).unwrap_or_default(),
            heights,
            styles,
            image_preview,
            heic_selected: selection.as_ref().is_some_and(|s| s.requires_conversion()),
            selected_file: selection.map(|s| s.file_name),
            has_image_line: form.image_line.as_deref().is_some_and(|line| !line.is_empty()),
            uploading,
            submit_label,
        }
    }
}
