//! Style tags and their storage codec.
//!
//! The `boulder.style` column is text holding a JSON array of tag strings.
//! [`decode`] and [`encode`] are the only way in and out of that form; the
//! rest of the catalogue works on the decoded `Vec<String>`.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::errors::{DomainError, Result};
use crate::models::StyleValue;

/// Fixed style vocabulary: stored tag, Spanish display label.
pub const STYLE_OPTIONS: [(&str, &str); 24] = [
    ("Flat approach", "Aproximación plana"),
    ("Uphill approach", "Aproximación en subida"),
    ("Steep uphill approach", "Aproximación en subida pronunciada"),
    ("Downhill approach", "Aproximación en bajada"),
    ("Morning sun", "Sol de mañana"),
    ("Afternoon sun", "Sol de tarde"),
    ("Tree-filtered sun (am)", "Sol filtrado por árboles (mañana)"),
    ("Tree-filtered sun (pm)", "Sol filtrado por árboles (tarde)"),
    ("Sunny most of the day", "Soleado la mayor parte del día"),
    ("Shady most of the day", "Sombreado la mayor parte del día"),
    ("Boulders dry fast", "Los bloques se secan rápido"),
    ("Boulders dry in rain", "Los bloques se escalan bajo la lluvia"),
    ("Start seated", "Inicio sentado"),
    ("\"Highball\", dangerous", "\"Highball\", peligroso"),
    ("Slabby problem", "Problema de Slab"),
    ("Very steep problem", "Problema muy desplomado"),
    ("Reachy, best if tall", "Morfo, mejor si eres alto"),
    ("Dynamic", "Dinámico"),
    ("Pumpy or sustained", "Bombeador o sostenido"),
    ("Technical", "Técnico"),
    ("Powerful", "Potente"),
    ("Pockets", "Pockets"),
    ("Small edges, crimpy", "Regletas, crimpy"),
    ("Slopey holds", "Agarres de Sloper"),
];

/// Normalizes either stored form into the tag list.
///
/// Text is parsed as JSON and must be an array of strings; an already decoded
/// list is returned unchanged; a missing value is an empty list.
pub fn decode(input: Option<&StyleValue>) -> Result<Vec<String>> {
    match input {
        None => Ok(Vec::new()),
        Some(StyleValue::Tags(tags)) => Ok(tags.clone()),
        Some(StyleValue::Text(text)) => serde_json::from_str::<Vec<String>>(text)
            .map_err(|e| DomainError::MalformedStyleData(format!("{text:?}: {e}"))),
    }
}

/// JSON array text for the `style` column. Inverse of [`decode`].
pub fn encode(tags: &[String]) -> String {
    Value::Array(tags.iter().cloned().map(Value::String).collect()).to_string()
}

/// Spanish label for a tag. Tags outside the vocabulary pass through.
pub fn label(tag: &str) -> &str {
    STYLE_OPTIONS
        .iter()
        .find(|(value, _)| *value == tag)
        .map(|(_, label)| *label)
        .unwrap_or(tag)
}

/// Card label for a height value; unknown values pass through, none is empty.
pub fn height_label(height: Option<&str>) -> &str {
    match height {
        None => "",
        Some(raw) => match raw.parse::<Height>() {
            Ok(known) => known.card_label(),
            Err(_) => raw,
        },
    }
}

/// How tall the problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Height {
    Lowball,
    Regular,
    Highball,
}

impl Height {
    pub const ALL: [Height; 3] = [Height::Lowball, Height::Regular, Height::Highball];

    /// Column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Height::Lowball => "lowball",
            Height::Regular => "regular",
            Height::Highball => "highball",
        }
    }

    pub fn card_label(self) -> &'static str {
        match self {
            Height::Lowball => "Lowball",
            Height::Regular => "Regular",
            Height::Highball => "Highball",
        }
    }

    pub fn form_label(self) -> &'static str {
        match self {
            Height::Lowball => "Bajo (Lowball)",
            Height::Regular => "Regular",
            Height::Highball => "Alto (Highball)",
        }
    }
}

impl FromStr for Height {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lowball" => Ok(Height::Lowball),
            "regular" => Ok(Height::Regular),
            "highball" => Ok(Height::Highball),
            other => Err(DomainError::Validation(format!("unknown height {other:?}"))),
        }
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
