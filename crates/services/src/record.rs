//! Boulder record model: drafts, edit state and the record sent to the store.

use chrono::{DateTime, Utc};
use domains::style;
use domains::{Boulder, DomainError, Result, StyleValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `type` given to every new record.
pub const DEFAULT_KIND: &str = "boulder";

/// Route id reported to the upload endpoint while the record is a draft.
pub const DRAFT_ROUTE_ID: &str = "new";

/// Catalogue-wide values the form needs but the user never types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Sector every new boulder is filed under.
    pub default_sector_id: Uuid,
}

/// Editable state of one boulder, with `style` held as the decoded tag list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoulderForm {
    pub id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub grade: Option<String>,
    pub quality: Option<i32>,
    pub kind: Option<String>,
    pub image: Option<String>,
    pub image_line: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub height: Option<String>,
    pub style: Vec<String>,
    pub top: Option<bool>,
    pub sector_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BoulderForm {
    /// Empty draft filed under the configured sector.
    pub fn default_draft(settings: &CatalogSettings) -> Self {
        Self {
            sector_id: Some(settings.default_sector_id),
            kind: Some(DEFAULT_KIND.to_string()),
            ..Self::default()
        }
    }

    /// Edit state for a stored record. Fails on unreadable `style` text.
    pub fn from_persisted(record: &Boulder) -> Result<Self> {
        let style = style::decode(record.style.as_ref())?;
        Ok(Self {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            grade: record.grade.clone(),
            quality: record.quality,
            kind: record.kind.clone(),
            image: record.image.clone(),
            image_line: record.image_line.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            height: record.height.clone(),
            style,
            top: record.top,
            sector_id: record.sector_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    pub fn is_draft(&self) -> bool {
        self.id.is_none()
    }

    /// Owner id for uploaded images: the record id, or `"new"`.
    pub fn route_id(&self) -> String {
        self.id
            .map(|id| id.to_string())
            .unwrap_or_else(|| DRAFT_ROUTE_ID.to_string())
    }

    /// The name is the only required field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("name must not be empty".into()));
        }
        Ok(())
    }

    /// Record to hand to the store, with `style` in its text form.
    ///
    /// A draft yields a record without `id` (a create); otherwise the id is
    /// kept (an update). Timestamps belong to the store and are left out.
    pub fn to_submission(&self) -> Boulder {
        Boulder {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            grade: self.grade.clone(),
            quality: self.quality,
            kind: self.kind.clone(),
            image: self.image.clone(),
            image_line: self.image_line.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            height: self.height.clone(),
            style: Some(StyleValue::Text(style::encode(&self.style))),
            top: self.top,
            sector_id: self.sector_id,
            created_at: None,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CatalogSettings {
        CatalogSettings {
            default_sector_id: Uuid::parse_str("5f08920b-ff8b-45ed-b3f8-a4976bdd71b7").unwrap(),
        }
    }

    #[test]
    fn draft_has_fixed_sector_and_kind() {
        let draft = BoulderForm::default_draft(&settings());
        assert!(draft.is_draft());
        assert_eq!(draft.name, "");
        assert_eq!(draft.kind.as_deref(), Some("boulder"));
        assert_eq!(draft.sector_id, Some(settings().default_sector_id));
        assert!(draft.style.is_empty());
        assert_eq!(draft.quality, None);
        assert_eq!(draft.route_id(), "new");
    }

    #[test]
    fn from_persisted_decodes_style_without_touching_source() {
        let record = Boulder {
            id: Some(Uuid::new_v4()),
            name: "El Techo".into(),
            style: Some(StyleValue::Text(r#"["Powerful","Pockets"]"#.into())),
            ..Boulder::default()
        };
        let before = record.clone();

        let form = BoulderForm::from_persisted(&record).unwrap();

        assert_eq!(form.style, vec!["Powerful".to_string(), "Pockets".to_string()]);
        assert_eq!(form.id, record.id);
        assert_eq!(record, before);
    }

    #[test]
    fn from_persisted_reports_malformed_style() {
        let record = Boulder {
            name: "Roto".into(),
            style: Some(StyleValue::Text("Dynamic".into())),
            ..Boulder::default()
        };
        assert!(matches!(
            BoulderForm::from_persisted(&record),
            Err(DomainError::MalformedStyleData(_))
        ));
    }

    #[test]
    fn draft_submission_has_no_id_key() {
        let mut draft = BoulderForm::default_draft(&settings());
        draft.name = "Bloque X".into();
        draft.style = vec!["Dynamic".into(), "Technical".into()];

        let submission = draft.to_submission();
        let json = serde_json::to_value(&submission).unwrap();

        assert!(json.get("id").is_none());
        assert_eq!(json["style"], r#"["Dynamic","Technical"]"#);
    }

    #[test]
    fn persisted_submission_keeps_id() {
        let id = Uuid::new_v4();
        let form = BoulderForm {
            id: Some(id),
            name: "Arista".into(),
            created_at: Some(Utc::now()),
            ..BoulderForm::default()
        };
        let submission = form.to_submission();
        assert_eq!(submission.id, Some(id));
        assert_eq!(submission.created_at, None);
        assert_eq!(form.route_id(), id.to_string());
    }

    #[test]
    fn only_the_name_is_required() {
        let mut form = BoulderForm::default_draft(&settings());
        form.name = "   ".into();
        assert!(matches!(form.validate(), Err(DomainError::Validation(_))));

        form.name = "Placa".into();
        form.quality = Some(150);
        assert!(form.validate().is_ok());
        assert_eq!(form.to_submission().quality, Some(150));
    }
}
