//! Pipeline – ties together content preparation, layout and rendering into
//! a single function call.

use std::io::Write;

use crate::assets::ImageAssets;
use crate::content::{prepare, WorksheetContent};
use crate::error::Result;
use crate::fonts::FontRegistry;
use crate::layout::compose_worksheet;
use crate::layout_config::{LayoutWarning, WorksheetLayout};
use crate::render::render_pdf;

/// Default page margin in points (0.75 in).
pub const PAGE_MARGIN_PT: f32 = 54.0;

/// Page geometry and branding for a worksheet.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    /// Page width in points (default: US Letter = 612).
    pub page_width: f32,
    /// Page height in points (default: US Letter = 792).
    pub page_height: f32,
    /// Page margin in points (default: 54).
    pub page_margin: f32,
    /// Inset of the decorative border from the page edge.
    pub border_inset: f32,
    /// Heading printed at the top of the page.
    pub header_title: String,
    /// Prefix of the footer code, e.g. `FS` → `FS-JOHN_3_16_ESV`.
    pub code_prefix: String,
    pub attribution: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: "Bible Copywork Worksheet".to_string(),
            page_width: 612.0,
            page_height: 792.0,
            page_margin: PAGE_MARGIN_PT,
            border_inset: 36.0,
            header_title: "Bible Copywork Worksheet".to_string(),
            code_prefix: "FS".to_string(),
            attribution: "© 2025 Faith Sparks Printables · For personal use only".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Width between the left and right margins.
    pub fn usable_width(&self) -> f32 {
        self.page_width - 2.0 * self.page_margin
    }

    /// Create an A4 config with the same margins.
    pub fn a4() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            ..Self::default()
        }
    }
}

/// Read-only resources shared by every render: fonts and header images.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    pub fonts: FontRegistry,
    pub images: ImageAssets,
}

impl Resources {
    pub fn new(fonts: FontRegistry, images: ImageAssets) -> Self {
        Self { fonts, images }
    }
}

/// Outcome of a successful render.
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub bytes_written: usize,
    pub warnings: Vec<LayoutWarning>,
}

/// Lay out a worksheet without rendering it – useful for testing.
pub fn compute_layout(
    content: &WorksheetContent,
    resources: &Resources,
    config: &PipelineConfig,
) -> Result<WorksheetLayout> {
    let prepared = prepare(content)?;
    Ok(compose_worksheet(
        &prepared,
        &resources.fonts,
        &resources.images,
        config,
    ))
}

/// Full pipeline: content → PDF bytes.
///
/// Returns `(pdf_bytes, layout)`.
pub fn generate_pdf(
    content: &WorksheetContent,
    resources: &Resources,
    config: &PipelineConfig,
) -> Result<(Vec<u8>, WorksheetLayout)> {
    let layout = compute_layout(content, resources, config)?;
    let bytes = render_pdf(&layout, &resources.fonts, &resources.images)?;
    Ok((bytes, layout))
}

/// Render one worksheet into `sink`.
///
/// The whole document is produced in memory first, so invalid content
/// never leaves a partial write behind.
pub fn render<W: Write>(
    content: &WorksheetContent,
    resources: &Resources,
    config: &PipelineConfig,
    sink: &mut W,
) -> Result<RenderReport> {
    let (bytes, layout) = generate_pdf(content, resources, config)?;
    sink.write_all(&bytes)?;
    sink.flush()?;
    log::info!(
        "rendered worksheet for {} ({} bytes, {} warning{})",
        content.reference,
        bytes.len(),
        layout.warnings.len(),
        if layout.warnings.len() == 1 { "" } else { "s" }
    );
    Ok(RenderReport {
        bytes_written: bytes.len(),
        warnings: layout.warnings,
    })
}
