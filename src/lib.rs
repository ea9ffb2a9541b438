//! # verse-copywork – printable Bible copywork worksheets
//!
//! This crate turns a verse record into a single-page, print-ready PDF
//! worksheet for children. The pipeline stages are:
//!
//! 1. **Prepare** – validate content and apply text policy ([`content`])
//! 2. **Measure** – font metrics and word wrapping ([`fonts`])
//! 3. **Layout** – stack the worksheet boxes into a page IR ([`layout`], [`layout_config`])
//! 4. **Render** – emit PDF bytes via printpdf ([`render`])
//!
//! Verse records can be fetched from an OpenAI-compatible chat API
//! ([`provider`]) and cached as JSON ([`store`]).

pub mod afm;
pub mod assets;
pub mod config;
pub mod content;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod layout_config;
pub mod pipeline;
pub mod provider;
pub mod reference;
pub mod render;
pub mod samples;
pub mod store;

// Re-exports for convenience
pub use content::{VerseRecord, WorksheetContent};
pub use error::{Result, WorksheetError};
pub use pipeline::{compute_layout, generate_pdf, render, PipelineConfig, RenderReport, Resources};
