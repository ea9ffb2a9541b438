//! Layout engine – stacks the worksheet boxes down a single page.
//!
//! Every box renderer is a pure function `draw_*(canvas, fonts, spec, top)`
//! that records its elements on a [`PageCanvas`] and returns the top of the
//! next box: `top − box_height − BOX_GAP`. [`compose_worksheet`] threads
//! that cursor through the fixed box order and adds the header and footer,
//! which sit at fixed positions independent of the cursor.

use crate::assets::{ImageAssets, ImageSlot};
use crate::content::PreparedWorksheet;
use crate::fonts::{wrap_text, FaceId, FontRegistry};
use crate::layout_config::{
    Element, LayoutWarning, Region, RegionKind, Stroke, TextRun, WorksheetLayout,
};
use crate::pipeline::PipelineConfig;

// ---------------------------------------------------------------------------
// Box geometry (points)
// ---------------------------------------------------------------------------

pub const PADDING: f32 = 10.0;
/// Vertical room reserved for a box title.
pub const TITLE_ALLOWANCE: f32 = 20.0;
pub const BOX_GAP: f32 = 10.0;
pub const CORNER_RADIUS: f32 = 8.0;
pub const TITLE_SIZE: f32 = 12.0;
pub const BODY_SIZE: f32 = 10.0;
pub const BODY_LEADING: f32 = 12.0;
pub const BOX_FILL_GRAY: f32 = 0.95;

pub const TRACE_SIZE: f32 = 30.0;
pub const TRACE_LEADING: f32 = 10.0;
/// Tracing lines wrap at the box width minus this.
pub const TRACE_INSET: f32 = 40.0;
pub const TRACE_UNDERLINE_DROP: f32 = 5.0;

/// Distance between baseline and topline of one handwriting row.
pub const LINE_SPACING: f32 = 22.0;
pub const ROW_PITCH: f32 = LINE_SPACING + 6.0;

pub const COLORING_MAX_HEIGHT: f32 = 180.0;
pub const COLORING_AREA_WIDTH: f32 = 324.0;
pub const COLORING_GAP: f32 = 28.8;
pub const COLORING_STROKE: f32 = 1.25;

pub const HEADER_IMAGE_SIZE: f32 = 50.0;
pub const HEADER_TITLE_SIZE: f32 = 18.0;
/// Reference lines this long or longer drop to the small size.
pub const REFERENCE_LENGTH_THRESHOLD: usize = 25;
pub const REFERENCE_SIZE: f32 = 14.0;
pub const REFERENCE_SIZE_SMALL: f32 = 12.0;

pub const VERSE_TITLE: &str = "Verse:";
pub const TRACING_TITLE: &str = "Trace it:";
pub const HANDWRITING_TITLE: &str = "Now write it yourself:";
pub const REFLECTION_TITLE: &str = "Think about this:";
pub const COLORING_TITLE: &str = "Coloring Prompt:";

const OUTLINE: Stroke = Stroke::black(1.0);

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// Collects the elements and regions of one page.
pub struct PageCanvas {
    layout: WorksheetLayout,
}

impl PageCanvas {
    pub fn new(title: &str, page_width: f32, page_height: f32) -> Self {
        Self {
            layout: WorksheetLayout::new(title, page_width, page_height),
        }
    }

    pub fn page_width(&self) -> f32 {
        self.layout.page_width_pt
    }

    pub fn push(&mut self, element: Element) {
        self.layout.elements.push(element);
    }

    pub fn text(&mut self, text: &str, x: f32, baseline: f32, face: FaceId, font_size: f32) {
        self.text_gray(text, x, baseline, face, font_size, 0.0);
    }

    pub fn text_gray(
        &mut self,
        text: &str,
        x: f32,
        baseline: f32,
        face: FaceId,
        font_size: f32,
        gray: f32,
    ) {
        if text.is_empty() {
            return;
        }
        self.push(Element::Text(TextRun {
            text: text.to_string(),
            x,
            baseline,
            face,
            font_size,
            gray,
        }));
    }

    pub fn rule(&mut self, x1: f32, x2: f32, y: f32, dashed: bool) {
        self.push(Element::Rule {
            x1,
            x2,
            y,
            stroke: OUTLINE,
            dashed,
        });
    }

    /// Rounded rectangle hanging down from `top`.
    pub fn rounded_box(
        &mut self,
        x: f32,
        top: f32,
        width: f32,
        height: f32,
        fill_gray: Option<f32>,
        stroke: Stroke,
    ) {
        self.push(Element::RoundedBox {
            x,
            y: top - height,
            width,
            height,
            radius: CORNER_RADIUS,
            fill_gray,
            stroke: Some(stroke),
        });
    }

    pub fn mark(&mut self, kind: RegionKind, x: f32, top: f32, width: f32, height: f32) {
        log::debug!("{kind:?}: top={top:.1} height={height:.1}");
        self.layout.regions.push(Region {
            kind,
            x,
            top,
            width,
            height,
        });
    }

    pub fn warn(&mut self, warning: LayoutWarning) {
        log::warn!("layout warning: {warning:?}");
        self.layout.warnings.push(warning);
    }

    pub fn finish(self) -> WorksheetLayout {
        self.layout
    }
}

// ---------------------------------------------------------------------------
// Box specs
// ---------------------------------------------------------------------------

/// Titled, filled box holding a wrapped paragraph.
#[derive(Debug, Clone)]
pub struct ParagraphBox<'a> {
    pub kind: RegionKind,
    pub title: &'a str,
    pub text: &'a str,
    pub x: f32,
    pub width: f32,
}

/// Outlined box of large text in a tracing face.
#[derive(Debug, Clone)]
pub struct TracingBox<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub x: f32,
    pub width: f32,
    pub cursive: bool,
}

/// Outlined box of empty ruled rows.
#[derive(Debug, Clone)]
pub struct HandwritingBox<'a> {
    pub title: &'a str,
    pub x: f32,
    pub width: f32,
    pub line_count: u32,
}

/// Final row: prompt label on the left, empty drawing area on the right.
#[derive(Debug, Clone)]
pub struct ColoringRow<'a> {
    pub title: &'a str,
    pub prompt: &'a str,
    pub x: f32,
    pub width: f32,
    /// Lowest y the row may reach (the bottom margin).
    pub bottom_limit: f32,
}

#[derive(Debug, Clone)]
pub enum BoxSpec<'a> {
    Paragraph(ParagraphBox<'a>),
    Tracing(TracingBox<'a>),
    Handwriting(HandwritingBox<'a>),
    Coloring(ColoringRow<'a>),
}

/// Draw any box and return the next cursor.
pub fn draw_box(canvas: &mut PageCanvas, fonts: &FontRegistry, spec: &BoxSpec, top: f32) -> f32 {
    match spec {
        BoxSpec::Paragraph(b) => draw_paragraph_box(canvas, fonts, b, top),
        BoxSpec::Tracing(b) => draw_tracing_box(canvas, fonts, b, top),
        BoxSpec::Handwriting(b) => draw_handwriting_box(canvas, b, top),
        BoxSpec::Coloring(b) => draw_coloring_row(canvas, fonts, b, top),
    }
}

// ---------------------------------------------------------------------------
// Paragraph box
// ---------------------------------------------------------------------------

fn paragraph_lines(fonts: &FontRegistry, text: &str, width: f32) -> Vec<String> {
    wrap_text(text, FaceId::Body, BODY_SIZE, width - 2.0 * PADDING, fonts)
}

/// Height a paragraph box of `width` needs for `text`.
pub fn paragraph_box_height(fonts: &FontRegistry, text: &str, width: f32) -> f32 {
    let lines = paragraph_lines(fonts, text, width);
    lines.len() as f32 * BODY_LEADING + 2.0 * PADDING + TITLE_ALLOWANCE
}

pub fn draw_paragraph_box(
    canvas: &mut PageCanvas,
    fonts: &FontRegistry,
    spec: &ParagraphBox,
    top: f32,
) -> f32 {
    let height = paragraph_box_height(fonts, spec.text, spec.width);
    fill_paragraph_box(canvas, fonts, spec, top, height);
    top - height - BOX_GAP
}

/// Paint a paragraph box at a given height, which may differ from its
/// content height (the coloring label is stretched to the row height).
fn fill_paragraph_box(
    canvas: &mut PageCanvas,
    fonts: &FontRegistry,
    spec: &ParagraphBox,
    top: f32,
    height: f32,
) {
    canvas.rounded_box(spec.x, top, spec.width, height, Some(BOX_FILL_GRAY), OUTLINE);
    draw_title(canvas, spec.title, spec.x, top);

    let text_top = top - PADDING - TITLE_ALLOWANCE / 2.0;
    let mut baseline = text_top - fonts.ascender_pt(FaceId::Body, BODY_SIZE);
    for line in paragraph_lines(fonts, spec.text, spec.width) {
        canvas.text(&line, spec.x + PADDING, baseline, FaceId::Body, BODY_SIZE);
        baseline -= BODY_LEADING;
    }
    canvas.mark(spec.kind, spec.x, top, spec.width, height);
}

fn draw_title(canvas: &mut PageCanvas, title: &str, x: f32, top: f32) {
    canvas.text(title, x + PADDING, top - PADDING - 2.0, FaceId::Bold, TITLE_SIZE);
}

// ---------------------------------------------------------------------------
// Tracing box
// ---------------------------------------------------------------------------

pub fn tracing_face(cursive: bool) -> FaceId {
    if cursive {
        FaceId::Cursive
    } else {
        FaceId::Dotted
    }
}

fn tracing_lines(fonts: &FontRegistry, spec: &TracingBox) -> Vec<String> {
    wrap_text(
        spec.text,
        tracing_face(spec.cursive),
        TRACE_SIZE,
        spec.width - TRACE_INSET,
        fonts,
    )
}

pub fn tracing_box_height(line_count: usize) -> f32 {
    line_count as f32 * (TRACE_SIZE + TRACE_LEADING) + 2.0 * PADDING + TITLE_ALLOWANCE
}

pub fn draw_tracing_box(
    canvas: &mut PageCanvas,
    fonts: &FontRegistry,
    spec: &TracingBox,
    top: f32,
) -> f32 {
    let face = tracing_face(spec.cursive);
    let lines = tracing_lines(fonts, spec);
    let height = tracing_box_height(lines.len());

    canvas.rounded_box(spec.x, top, spec.width, height, None, OUTLINE);
    draw_title(canvas, spec.title, spec.x, top);

    let mut baseline = top - PADDING - TRACE_SIZE;
    for line in &lines {
        canvas.text(line, spec.x + PADDING, baseline, face, TRACE_SIZE);
        if spec.cursive {
            canvas.rule(
                spec.x + PADDING,
                spec.x + spec.width - PADDING,
                baseline - TRACE_UNDERLINE_DROP,
                false,
            );
        }
        baseline -= TRACE_SIZE + TRACE_LEADING;
    }
    canvas.mark(RegionKind::Tracing, spec.x, top, spec.width, height);
    top - height - BOX_GAP
}

// ---------------------------------------------------------------------------
// Handwriting box
// ---------------------------------------------------------------------------

pub fn handwriting_box_height(line_count: u32) -> f32 {
    line_count as f32 * ROW_PITCH + 2.0 * PADDING + TITLE_ALLOWANCE
}

pub fn draw_handwriting_box(canvas: &mut PageCanvas, spec: &HandwritingBox, top: f32) -> f32 {
    let height = handwriting_box_height(spec.line_count);
    canvas.rounded_box(spec.x, top, spec.width, height, None, OUTLINE);
    draw_title(canvas, spec.title, spec.x, top);

    let x1 = spec.x + PADDING;
    let x2 = spec.x + spec.width - PADDING;
    let mut baseline = top - PADDING - 28.0;
    for _ in 0..spec.line_count {
        canvas.rule(x1, x2, baseline, false);
        canvas.rule(x1, x2, baseline + LINE_SPACING / 2.0, true);
        canvas.rule(x1, x2, baseline + LINE_SPACING, false);
        baseline -= ROW_PITCH;
    }
    canvas.mark(RegionKind::Handwriting, spec.x, top, spec.width, height);
    top - height - BOX_GAP
}

// ---------------------------------------------------------------------------
// Coloring row
// ---------------------------------------------------------------------------

/// Row height: the space left above `bottom_limit`, capped at
/// [`COLORING_MAX_HEIGHT`], never negative.
pub fn coloring_row_height(top: f32, bottom_limit: f32) -> f32 {
    (top - bottom_limit).min(COLORING_MAX_HEIGHT).max(0.0)
}

pub fn draw_coloring_row(
    canvas: &mut PageCanvas,
    fonts: &FontRegistry,
    spec: &ColoringRow,
    top: f32,
) -> f32 {
    let height = coloring_row_height(top, spec.bottom_limit);
    let area_width = COLORING_AREA_WIDTH.min(spec.width - COLORING_GAP).max(0.0);
    let label_width = (spec.width - area_width - COLORING_GAP).max(0.0);

    let label = ParagraphBox {
        kind: RegionKind::ColoringLabel,
        title: spec.title,
        text: spec.prompt,
        x: spec.x,
        width: label_width,
    };
    let needed = paragraph_box_height(fonts, spec.prompt, label_width);
    if needed > height {
        canvas.warn(LayoutWarning::ColoringLabelClipped {
            needed,
            available: height,
        });
    }
    fill_paragraph_box(canvas, fonts, &label, top, height);

    let area_x = spec.x + label_width + COLORING_GAP;
    canvas.rounded_box(
        area_x,
        top,
        area_width,
        height,
        None,
        Stroke::black(COLORING_STROKE),
    );
    canvas.mark(RegionKind::ColoringArea, area_x, top, area_width, height);
    top - height - BOX_GAP
}

// ---------------------------------------------------------------------------
// Header and footer
// ---------------------------------------------------------------------------

pub fn reference_font_size(reference_line: &str) -> f32 {
    if reference_line.chars().count() < REFERENCE_LENGTH_THRESHOLD {
        REFERENCE_SIZE
    } else {
        REFERENCE_SIZE_SMALL
    }
}

fn centered_x(canvas: &PageCanvas, fonts: &FontRegistry, text: &str, face: FaceId, size: f32) -> f32 {
    (canvas.page_width() - fonts.measure_text_width(text, face, size)) / 2.0
}

/// Header images, title and reference line. Returns the cursor for the
/// first box.
pub fn draw_header(
    canvas: &mut PageCanvas,
    fonts: &FontRegistry,
    assets: &ImageAssets,
    config: &PipelineConfig,
    reference_line: &str,
) -> f32 {
    let margin = config.page_margin;
    let page_w = config.page_width;
    let header_top = config.page_height - margin - 10.0;
    let mut y = header_top;

    let image_bottom = y - HEADER_IMAGE_SIZE;
    for (slot, x) in [
        (ImageSlot::Logo, margin),
        (ImageSlot::Qr, page_w - margin - HEADER_IMAGE_SIZE),
    ] {
        if let Some(img) = assets.get(slot) {
            let (w, h) = fit_within(img.px_width, img.px_height, HEADER_IMAGE_SIZE);
            canvas.push(Element::Image {
                slot,
                x: x + (HEADER_IMAGE_SIZE - w) / 2.0,
                y: image_bottom + (HEADER_IMAGE_SIZE - h) / 2.0,
                width: w,
                height: h,
            });
        }
    }

    let title = config.header_title.as_str();
    let title_x = centered_x(canvas, fonts, title, FaceId::Bold, HEADER_TITLE_SIZE);
    canvas.text(title, title_x, y - 12.0, FaceId::Bold, HEADER_TITLE_SIZE);
    y -= HEADER_IMAGE_SIZE + 10.0;

    let size = reference_font_size(reference_line);
    log::debug!("reference line {reference_line:?} at {size}pt");
    let ref_x = centered_x(canvas, fonts, reference_line, FaceId::Bold, size);
    canvas.text(reference_line, ref_x, y, FaceId::Bold, size);
    y -= 20.0;

    canvas.mark(RegionKind::Header, 0.0, header_top, page_w, header_top - y);
    y
}

/// Scale a pixel size to fit a `size`×`size` square, keeping aspect ratio.
fn fit_within(px_width: u32, px_height: u32, size: f32) -> (f32, f32) {
    if px_width == 0 || px_height == 0 {
        return (size, size);
    }
    let scale = (size / px_width as f32).min(size / px_height as f32);
    (px_width as f32 * scale, px_height as f32 * scale)
}

pub fn footer_code(config: &PipelineConfig, verse_code: &str) -> String {
    format!("{}-{}", config.code_prefix, verse_code)
}

/// Decorative border, right-aligned code and attribution line.
pub fn draw_footer(
    canvas: &mut PageCanvas,
    fonts: &FontRegistry,
    config: &PipelineConfig,
    verse_code: &str,
) {
    let inset = config.border_inset;
    canvas.push(Element::Rect {
        x: inset,
        y: inset,
        width: config.page_width - 2.0 * inset,
        height: config.page_height - 2.0 * inset,
        stroke: Stroke {
            width: 0.5,
            gray: 0.8,
        },
    });

    let code = footer_code(config, verse_code);
    let code_x = config.page_width
        - config.page_margin
        - fonts.measure_text_width(&code, FaceId::Bold, TITLE_SIZE);
    canvas.text(&code, code_x, 23.04, FaceId::Bold, TITLE_SIZE);

    let attribution = config.attribution.as_str();
    let attr_x = centered_x(canvas, fonts, attribution, FaceId::Body, 8.0);
    canvas.text_gray(attribution, attr_x, 16.56, FaceId::Body, 8.0, 0.4);

    canvas.mark(
        RegionKind::Footer,
        0.0,
        config.page_margin,
        config.page_width,
        config.page_margin,
    );
}

// ---------------------------------------------------------------------------
// Page composition
// ---------------------------------------------------------------------------

/// The content boxes in drawing order.
pub fn worksheet_boxes<'a>(
    worksheet: &'a PreparedWorksheet,
    config: &PipelineConfig,
) -> Vec<BoxSpec<'a>> {
    let x = config.page_margin;
    let width = config.usable_width();
    vec![
        BoxSpec::Paragraph(ParagraphBox {
            kind: RegionKind::Verse,
            title: VERSE_TITLE,
            text: &worksheet.verse_text,
            x,
            width,
        }),
        BoxSpec::Tracing(TracingBox {
            title: TRACING_TITLE,
            text: &worksheet.tracing_text,
            x,
            width,
            cursive: worksheet.cursive,
        }),
        BoxSpec::Handwriting(HandwritingBox {
            title: HANDWRITING_TITLE,
            x,
            width,
            line_count: worksheet.handwriting_lines,
        }),
        BoxSpec::Paragraph(ParagraphBox {
            kind: RegionKind::Reflection,
            title: REFLECTION_TITLE,
            text: &worksheet.reflection_prompt,
            x,
            width,
        }),
        BoxSpec::Coloring(ColoringRow {
            title: COLORING_TITLE,
            prompt: &worksheet.image_prompt,
            x,
            width,
            bottom_limit: config.page_margin,
        }),
    ]
}

/// Lay out one worksheet page.
pub fn compose_worksheet(
    worksheet: &PreparedWorksheet,
    fonts: &FontRegistry,
    assets: &ImageAssets,
    config: &PipelineConfig,
) -> WorksheetLayout {
    let mut canvas = PageCanvas::new(&config.title, config.page_width, config.page_height);

    let start = draw_header(&mut canvas, fonts, assets, config, &worksheet.reference_line);
    let end = worksheet_boxes(worksheet, config)
        .iter()
        .fold(start, |top, spec| draw_box(&mut canvas, fonts, spec, top));
    log::debug!("content cursor {start:.1} → {end:.1}");

    draw_footer(&mut canvas, fonts, config, &worksheet.verse_code);

    let mut layout = canvas.finish();
    let limit = config.page_margin;
    let overflows: Vec<LayoutWarning> = layout
        .regions
        .iter()
        .filter(|r| !matches!(r.kind, RegionKind::Header | RegionKind::Footer))
        .filter(|r| r.bottom() < limit - 0.01)
        .map(|r| LayoutWarning::Overflow {
            region: r.kind,
            bottom: r.bottom(),
            limit,
        })
        .collect();
    for warning in &overflows {
        log::warn!("worksheet overflows the page: {warning:?}");
    }
    layout.warnings.extend(overflows);
    layout
}
