//! Label anchors printed in each form cell, with their common OCR misreadings.

use crate::error::ParseError;
use crate::models::case::FieldKind;

/// A printed label and the misreadings accepted in its place.
#[derive(Debug, Clone, Copy)]
pub struct Label {
    pub canonical: &'static str,
    pub misreadings: &'static [&'static str],
}

pub const ADDRESS: Label = Label {
    canonical: "ADDRESS",
    misreadings: &["ADORESS", "AOORESS", "AODRESS"],
};

pub const CITY: Label = Label {
    canonical: "CITY",
    misreadings: &["CHY"],
};

pub const STATE: Label = Label {
    canonical: "STATE",
    misreadings: &[],
};

pub const ZIP: Label = Label {
    canonical: "ZIP",
    misreadings: &[],
};

pub const CODE: Label = Label {
    canonical: "CODE",
    misreadings: &[],
};

/// Characters OCR substitutes for the colon after a label.
const COLON_ARTIFACTS: [char; 5] = [':', ';', ',', '.', '\''];

impl Label {
    /// Byte offset just past the first spelling found, canonical first.
    pub fn find_end(&self, text: &str) -> Option<usize> {
        // ASCII uppercasing keeps byte offsets valid for `text`.
        let upper = text.to_ascii_uppercase();
        std::iter::once(self.canonical)
            .chain(self.misreadings.iter().copied())
            .find_map(|spelling| upper.find(spelling).map(|start| start + spelling.len()))
    }

    /// Text after the label, trimmed. Fails when the label is missing.
    pub fn after<'a>(&self, field: FieldKind, text: &'a str) -> Result<&'a str, ParseError> {
        let text = text.trim();
        let end = self.find_end(text).ok_or_else(|| ParseError::FieldParse {
            field,
            raw: text.to_string(),
        })?;
        Ok(text[end..].trim())
    }
}

/// Drop one leading colon artifact and re-trim.
pub fn strip_colon(value: &str) -> &str {
    match value.strip_prefix(COLON_ARTIFACTS) {
        Some(rest) => rest.trim(),
        None => value,
    }
}

/// Text after `label` with the colon artifact removed. Fails when nothing is left.
pub fn value_after<'a>(
    label: Label,
    field: FieldKind,
    text: &'a str,
) -> Result<&'a str, ParseError> {
    let value = strip_colon(label.after(field, text)?);
    if value.is_empty() {
        return Err(ParseError::FieldParse {
            field,
            raw: text.trim().to_string(),
        });
    }
    Ok(value)
}
