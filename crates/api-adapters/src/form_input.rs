//! Multipart body of a create/edit form submission.

use std::str::FromStr;

use axum::extract::Multipart;
use domains::style::Height;
use domains::{DomainError, SelectedImage};
use services::BoulderForm;

use crate::error::WebResult;

/// Raw values as the browser sent them.
#[derive(Debug, Default)]
pub struct FormInput {
    pub name: String,
    pub description: String,
    pub grade: String,
    pub quality: String,
    pub height: String,
    pub latitude: String,
    pub longitude: String,
    pub top: bool,
    pub style: Vec<String>,
    pub image: Option<SelectedImage>,
}

impl FormInput {
    pub async fn read(multipart: &mut Multipart) -> WebResult<Self> {
        let mut input = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match name.as_str() {
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field.bytes().await?;
                    // Browsers send an empty part when no file was chosen.
                    if !file_name.is_empty() && !data.is_empty() {
                        input.image = Some(SelectedImage::new(file_name, content_type, data));
                    }
                }
                "name" => input.name = field.text().await?,
                "description" => input.description = field.text().await?,
                "grade" => input.grade = field.text().await?,
                "quality" => input.quality = field.text().await?,
                "height" => input.height = field.text().await?,
                "latitude" => input.latitude = field.text().await?,
                "longitude" => input.longitude = field.text().await?,
                "top" => input.top = field.text().await? == "true",
                "style" => input.style.push(field.text().await?),
                other => tracing::debug!(field = other, "ignoring form field"),
            }
        }

        Ok(input)
    }

    /// Copies the submitted values onto the form. The file part is left in
    /// `image` for the caller.
    ///
    /// Every value that parses is applied, so the re-rendered form shows what
    /// the user typed. Unparseable numbers keep their previous value and are
    /// reported together as one validation error.
    pub fn apply(&self, form: &mut BoulderForm) -> Result<(), DomainError> {
        let mut problems = Vec::new();

        form.name = self.name.trim().to_string();
        form.description = non_empty(&self.description);
        form.grade = non_empty(&self.grade);
        form.top = Some(self.top);
        form.style = self.style.clone();

        match parse_optional::<i32>(&self.quality) {
            Ok(quality) => form.quality = quality.map(|q| q.clamp(0, 100)),
            Err(()) => problems.push("quality"),
        }
        match parse_optional::<Height>(&self.height) {
            Ok(height) => form.height = height.map(|h| h.as_str().to_string()),
            Err(()) => problems.push("height"),
        }
        match parse_coordinate(&self.latitude, 90.0) {
            Ok(latitude) => form.latitude = latitude,
            Err(()) => problems.push("latitude"),
        }
        match parse_coordinate(&self.longitude, 180.0) {
            Ok(longitude) => form.longitude = longitude,
            Err(()) => problems.push("longitude"),
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(format!(
                "invalid value for {}",
                problems.join(", ")
            )))
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_optional<T: FromStr>(raw: &str) -> Result<Option<T>, ()> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| ())
}

fn parse_coordinate(raw: &str, limit: f64) -> Result<Option<f64>, ()> {
    match parse_optional::<f64>(raw)? {
        Some(value) if !value.is_finite() || value.abs() > limit => Err(()),
        parsed => Ok(parsed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> FormInput {
        FormInput {
            name: "  Bloque X ".into(),
            description: "".into(),
            grade: "6B+".into(),
            quality: "80".into(),
            height: "highball".into(),
            latitude: "40.4168".into(),
            longitude: "-3.7038".into(),
            top: true,
            style: vec!["Dynamic".into(), "Technical".into()],
            image: None,
        }
    }

    #[test]
    fn valid_input_is_applied() {
        let mut form = BoulderForm::default();
        filled().apply(&mut form).unwrap();

        assert_eq!(form.name, "Bloque X");
        assert_eq!(form.description, None);
        assert_eq!(form.grade.as_deref(), Some("6B+"));
        assert_eq!(form.quality, Some(80));
        assert_eq!(form.height.as_deref(), Some("highball"));
        assert_eq!(form.latitude, Some(40.4168));
        assert_eq!(form.longitude, Some(-3.7038));
        assert_eq!(form.top, Some(true));
        assert_eq!(form.style, ["Dynamic", "Technical"]);
    }

    #[test]
    fn bad_numbers_keep_previous_values_but_apply_the_rest() {
        let mut form = BoulderForm {
            latitude: Some(1.0),
            ..BoulderForm::default()
        };
        let input = FormInput {
            latitude: "north".into(),
            longitude: "500".into(),
            ..filled()
        };

        let err = input.apply(&mut form).unwrap_err();

        assert_eq!(
            err,
            DomainError::Validation("invalid value for latitude, longitude".into())
        );
        assert_eq!(form.latitude, Some(1.0));
        assert_eq!(form.name, "Bloque X");
        assert_eq!(form.quality, Some(80));
    }

    #[test]
    fn blank_fields_clear_optional_values() {
        let mut form = BoulderForm {
            quality: Some(50),
            height: Some("regular".into()),
            ..BoulderForm::default()
        };
        FormInput::default().apply(&mut form).unwrap();

        assert_eq!(form.quality, None);
        assert_eq!(form.height, None);
        assert_eq!(form.top, Some(false));
        assert!(form.style.is_empty());
    }

    #[test]
    fn quality_is_kept_on_the_slider_scale() {
        let mut form = BoulderForm::default();
        FormInput {
            quality: "250".into(),
            ..FormInput::default()
        }
        .apply(&mut form)
        .unwrap();
        assert_eq!(form.quality, Some(100));
    }
}
