//! Error types shared by the layout engine and its entry points.

use thiserror::Error;

/// Hard failures surfaced by the worksheet pipeline.
///
/// Missing decorative images are not represented here: they are logged and
/// skipped. Content that overflows the page is reported as a
/// [`LayoutWarning`](crate::layout_config::LayoutWarning) instead.
#[derive(Debug, Error)]
pub enum WorksheetError {
    /// A required field is missing or malformed; nothing is rendered.
    #[error("invalid worksheet content: {0}")]
    InvalidContent(String),

    /// A mandatory resource (font file, configuration value) is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = WorksheetError> = std::result::Result<T, E>;
