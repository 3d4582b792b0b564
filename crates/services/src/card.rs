//! Read-only card shown for each boulder in the listing.

use domains::style;
use domains::Boulder;
use uuid::Uuid;

/// Display-ready values for one boulder card.
#[derive(Debug, Clone, PartialEq)]
pub struct BoulderCard {
    pub id: Option<Uuid>,
    pub name: String,
    pub grade: String,
    pub description: String,
    pub kind: String,
    pub height: String,
    pub quality: i32,
    pub top: &'static str,
    /// Spanish labels, in stored order.
    pub styles: Vec<String>,
    pub map_link: Option<String>,
    pub image: Option<String>,
    pub image_line: Option<String>,
}

impl BoulderCard {
    pub fn from_boulder(boulder: &Boulder) -> Self {
        let styles = match style::decode(boulder.style.as_ref()) {
            Ok(tags) => tags.iter().map(|tag| style::label(tag).to_string()).collect(),
            Err(err) => {
                tracing::warn!(boulder_id = ?boulder.id, %err, "showing boulder without styles");
                Vec::new()
            }
        };

        Self {
            id: boulder.id,
            name: boulder.name.clone(),
            grade: or_fallback(boulder.grade.as_deref(), "Sin grado"),
            description: or_fallback(boulder.description.as_deref(), "Sin descripción"),
            kind: or_fallback(boulder.kind.as_deref(), "No especificado"),
            height: or_fallback(
                Some(style::height_label(boulder.height.as_deref())),
                "No especificada",
            ),
            quality: display_quality(boulder.quality),
            top: if boulder.top.unwrap_or(false) { "Sí" } else { "No" },
            styles,
            map_link: map_link(boulder),
            image: boulder.image.clone().filter(|url| !url.is_empty()),
            image_line: boulder.image_line.clone().filter(|url| !url.is_empty()),
        }
    }
}

/// Quality as shown on a 0–100 scale; absent reads as 0.
pub fn display_quality(quality: Option<i32>) -> i32 {
    quality.unwrap_or(0).clamp(0, 100)
}

/// Google Maps link, offered only when both coordinates are known.
pub fn map_link(boulder: &Boulder) -> Option<String> {
    boulder
        .coordinates()
        .map(|(lat, lng)| format!("https://maps.google.com/?q={lat},{lng}"))
}

fn or_fallback(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}
