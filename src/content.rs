//! Worksheet content – the provider record, its validation into
//! [`WorksheetContent`], and the text-policy steps applied before layout.
//!
//! Layout never sees raw provider output. The record is validated first,
//! then [`prepare`] applies capitalization and the tracing-text policy so
//! the box renderers only choose fonts and lines.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorksheetError};

/// Verses at or below this many words are traced in full, whatever excerpt
/// the provider supplied.
pub const TRACE_WORD_LIMIT: usize = 26;

/// Practice lines drawn when the record does not say.
pub const DEFAULT_HANDWRITING_LINES: u32 = 3;

/// JSON record as returned by the text provider and stored in the cache.
///
/// Every field is optional at the serde level so a partial record can be
/// parsed and then rejected with a precise [`WorksheetError::InvalidContent`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_verse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceable_verse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handwriting_lines: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_idea: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursive: Option<bool>,
}

impl VerseRecord {
    /// Parse a record from JSON text. Malformed JSON is invalid content.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| WorksheetError::InvalidContent(format!("unparseable verse record: {e}")))
    }
}

/// Immutable input to the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksheetContent {
    pub reference: String,
    pub version: String,
    pub full_text: String,
    pub traceable_text: Option<String>,
    pub handwriting_line_count: u32,
    pub reflection_prompt: String,
    pub image_prompt: String,
    pub cursive: bool,
}

impl WorksheetContent {
    /// Validate a provider record.
    ///
    /// `verse` and `fullVerse` are required and must not be blank. The
    /// record's own `version` wins over `fallback_version`.
    pub fn from_record(record: &VerseRecord, fallback_version: &str) -> Result<Self> {
        let reference = required(record.verse.as_deref(), "verse")?;
        let full_text = required(record.full_verse.as_deref(), "fullVerse")?;
        let version = record
            .version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(fallback_version)
            .trim()
            .to_string();
        if version.is_empty() {
            return Err(WorksheetError::InvalidContent(
                "no translation version for record".to_string(),
            ));
        }

        Ok(Self {
            reference,
            version,
            full_text,
            traceable_text: optional(record.traceable_verse.as_deref()),
            handwriting_line_count: record
                .handwriting_lines
                .unwrap_or(DEFAULT_HANDWRITING_LINES),
            reflection_prompt: optional(record.reflection_question.as_deref()).unwrap_or_default(),
            image_prompt: optional(record.image_idea.as_deref()).unwrap_or_default(),
            cursive: record.cursive.unwrap_or(false),
        })
    }

    /// Re-check the invariants of a hand-built content value.
    pub fn validate(&self) -> Result<()> {
        if self.reference.trim().is_empty() {
            return Err(WorksheetError::InvalidContent("empty reference".to_string()));
        }
        if self.full_text.trim().is_empty() {
            return Err(WorksheetError::InvalidContent("empty verse text".to_string()));
        }
        if self.version.trim().is_empty() {
            return Err(WorksheetError::InvalidContent("empty version".to_string()));
        }
        Ok(())
    }

    /// Back to the cache format.
    pub fn to_record(&self) -> VerseRecord {
        VerseRecord {
            verse: Some(self.reference.clone()),
            full_verse: Some(self.full_text.clone()),
            traceable_verse: self.traceable_text.clone(),
            handwriting_lines: Some(self.handwriting_line_count),
            reflection_question: Some(self.reflection_prompt.clone()),
            image_idea: Some(self.image_prompt.clone()),
            version: Some(self.version.to_uppercase()),
            cursive: Some(self.cursive),
        }
    }
}

fn required(value: Option<&str>, field: &str) -> Result<String> {
    optional(value)
        .ok_or_else(|| WorksheetError::InvalidContent(format!("missing required field `{field}`")))
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Content after text policy has been applied. This is all the layout
/// engine reads.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedWorksheet {
    /// Centered header line, e.g. `John 3:16 (ESV)`.
    pub reference_line: String,
    pub verse_text: String,
    pub tracing_text: String,
    pub reflection_prompt: String,
    pub image_prompt: String,
    pub handwriting_lines: u32,
    pub cursive: bool,
    /// Footer code without its prefix, e.g. `JOHN_3_16_ESV`.
    pub verse_code: String,
}

/// Apply capitalization and the tracing-text policy.
pub fn prepare(content: &WorksheetContent) -> Result<PreparedWorksheet> {
    content.validate()?;
    let tracing = derive_tracing_text(&content.full_text, content.traceable_text.as_deref());
    Ok(PreparedWorksheet {
        reference_line: reference_line(&content.reference, &content.version),
        verse_text: capitalize_first_letter(&content.full_text),
        tracing_text: capitalize_first_letter(tracing),
        reflection_prompt: capitalize_first_letter(&content.reflection_prompt),
        image_prompt: capitalize_first_letter(&content.image_prompt),
        handwriting_lines: content.handwriting_line_count,
        cursive: content.cursive,
        verse_code: verse_code(&content.reference, &content.version),
    })
}

/// Upper-case the first character only when it is a lowercase letter.
pub fn capitalize_first_letter(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => first.to_uppercase().chain(chars).collect(),
        _ => text.to_string(),
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Pick the text to trace.
///
/// A verse of [`TRACE_WORD_LIMIT`] words or fewer is always traced in full.
/// Longer verses use the supplied excerpt, or the full verse if there is
/// none.
pub fn derive_tracing_text<'a>(full_text: &'a str, traceable: Option<&'a str>) -> &'a str {
    if word_count(full_text) <= TRACE_WORD_LIMIT {
        return full_text;
    }
    traceable
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(full_text)
}

pub fn reference_line(reference: &str, version: &str) -> String {
    format!("{} ({})", reference.trim(), version.trim().to_uppercase())
}

/// Deterministic footer code: reference and version upper-cased, anything
/// that is not a letter or digit replaced with `_`.
pub fn verse_code(reference: &str, version: &str) -> String {
    let sanitize = |s: &str| -> String {
        s.trim()
            .to_uppercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect()
    };
    format!("{}_{}", sanitize(reference), sanitize(version))
}
