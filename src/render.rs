//! PDF renderer – takes a [`WorksheetLayout`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use std::collections::HashMap;

use printpdf::*;

use crate::assets::{ImageAssets, ImageSlot};
use crate::error::{Result, WorksheetError};
use crate::fonts::{FaceId, FontRegistry};
use crate::layout_config::{Element, Stroke as StrokeStyle, TextRun, WorksheetLayout};

/// Bezier handle length for a quarter circle of radius 1.
const KAPPA: f32 = 0.552_284_8;

const PT_TO_MM: f32 = 0.352_778;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// How one face is written into the content stream.
#[derive(Clone)]
enum FontHandle {
    Builtin(BuiltinFont),
    Embedded(FontId),
}

/// Render a worksheet layout into PDF bytes.
///
/// Tracing faces backed by font files are embedded; builtin faces use the
/// standard Helvetica family. Header images that fail to encode are skipped
/// with a `log::warn`.
pub fn render_pdf(
    layout: &WorksheetLayout,
    fonts: &FontRegistry,
    assets: &ImageAssets,
) -> Result<Vec<u8>> {
    let page_w = Mm(layout.page_width_pt * PT_TO_MM);
    let page_h = Mm(layout.page_height_pt * PT_TO_MM);

    let mut doc = PdfDocument::new(&layout.title);
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();

    // ── Fonts ─────────────────────────────────────────────────────────────
    let mut handles: HashMap<FaceId, FontHandle> = HashMap::new();
    handles.insert(FaceId::Body, FontHandle::Builtin(BuiltinFont::Helvetica));
    handles.insert(FaceId::Bold, FontHandle::Builtin(BuiltinFont::HelveticaBold));
    for (face, fallback) in [
        (FaceId::Dotted, BuiltinFont::Helvetica),
        (FaceId::Cursive, BuiltinFont::HelveticaOblique),
    ] {
        let handle = match fonts.get(face).embedded_bytes() {
            Some(bytes) => {
                let parsed = ParsedFont::from_bytes(bytes, 0, &mut warnings).ok_or_else(|| {
                    WorksheetError::Pdf(format!("could not embed {face:?} tracing font"))
                })?;
                FontHandle::Embedded(doc.add_font(&parsed))
            }
            None => FontHandle::Builtin(fallback),
        };
        handles.insert(face, handle);
    }

    // ── Images ────────────────────────────────────────────────────────────
    let mut images: HashMap<ImageSlot, ImageResource> = HashMap::new();
    for element in &layout.elements {
        let Element::Image { slot, .. } = element else {
            continue;
        };
        if images.contains_key(slot) {
            continue;
        }
        let Some(data) = assets.get(*slot) else {
            log::warn!("skipping {slot:?} image, not loaded");
            continue;
        };
        let raw = match RawImage::decode_from_bytes(&data.bytes, &mut warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping {slot:?} image, PDF encode error: {e}");
                continue;
            }
        };
        images.insert(
            *slot,
            ImageResource {
                xobj_id: doc.add_image(&raw),
                px_width: data.px_width,
                px_height: data.px_height,
            },
        );
    }

    // ── Page ──────────────────────────────────────────────────────────────
    let mut ops = Vec::new();
    for element in &layout.elements {
        render_element(&mut ops, element, &handles, &images);
    }

    doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    for w in &warnings {
        log::debug!("printpdf: {w:?}");
    }
    Ok(bytes)
}

fn gray(level: f32) -> Color {
    Color::Rgb(Rgb {
        r: level,
        g: level,
        b: level,
        icc_profile: None,
    })
}

fn point(x: f32, y: f32, bezier: bool) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier,
    }
}

/// Outline of a rectangle with quarter-circle corners. A point flagged
/// `bezier` is followed by the two control points of a cubic curve.
fn rounded_rect_points(x: f32, y: f32, width: f32, height: f32, radius: f32) -> Vec<LinePoint> {
    let (x0, y0, x1, y1) = (x, y, x + width, y + height);
    let r = radius.min(width / 2.0).min(height / 2.0).max(0.0);
    if r <= 0.0 {
        return vec![
            point(x0, y0, false),
            point(x1, y0, false),
            point(x1, y1, false),
            point(x0, y1, false),
        ];
    }
    let k = r * KAPPA;
    vec![
        point(x0 + r, y0, false),
        point(x1 - r, y0, true),
        point(x1 - r + k, y0, true),
        point(x1, y0 + r - k, false),
        point(x1, y0 + r, false),
        point(x1, y1 - r, true),
        point(x1, y1 - r + k, true),
        point(x1 - r + k, y1, false),
        point(x1 - r, y1, false),
        point(x0 + r, y1, true),
        point(x0 + r - k, y1, true),
        point(x0, y1 - r + k, false),
        point(x0, y1 - r, false),
        point(x0, y0 + r, true),
        point(x0, y0 + r - k, true),
        point(x0 + r - k, y0, false),
        point(x0 + r, y0, false),
    ]
}

fn set_stroke(ops: &mut Vec<Op>, stroke: &StrokeStyle) {
    ops.push(Op::SetOutlineColor {
        col: gray(stroke.gray),
    });
    ops.push(Op::SetOutlineThickness {
        pt: Pt(stroke.width),
    });
}

fn render_element(
    ops: &mut Vec<Op>,
    element: &Element,
    fonts: &HashMap<FaceId, FontHandle>,
    images: &HashMap<ImageSlot, ImageResource>,
) {
    match element {
        Element::RoundedBox {
            x,
            y,
            width,
            height,
            radius,
            fill_gray,
            stroke,
        } => {
            let mode = match (fill_gray, stroke) {
                (Some(_), Some(_)) => PaintMode::FillStroke,
                (Some(_), None) => PaintMode::Fill,
                (None, Some(_)) => PaintMode::Stroke,
                (None, None) => return,
            };
            ops.push(Op::SaveGraphicsState);
            if let Some(level) = fill_gray {
                ops.push(Op::SetFillColor { col: gray(*level) });
            }
            if let Some(stroke) = stroke {
                set_stroke(ops, stroke);
            }
            ops.push(Op::DrawPolygon {
                polygon: Polygon {
                    rings: vec![PolygonRing {
                        points: rounded_rect_points(*x, *y, *width, *height, *radius),
                    }],
                    mode,
                    winding_order: WindingOrder::NonZero,
                },
            });
            ops.push(Op::RestoreGraphicsState);
        }
        Element::Rect {
            x,
            y,
            width,
            height,
            stroke,
        } => {
            ops.push(Op::SaveGraphicsState);
            set_stroke(ops, stroke);
            ops.push(Op::DrawLine {
                line: Line {
                    points: rounded_rect_points(*x, *y, *width, *height, 0.0),
                    is_closed: true,
                },
            });
            ops.push(Op::RestoreGraphicsState);
        }
        Element::Rule {
            x1,
            x2,
            y,
            stroke,
            dashed,
        } => {
            ops.push(Op::SaveGraphicsState);
            set_stroke(ops, stroke);
            if *dashed {
                ops.push(Op::SetLineDashPattern {
                    dash: LineDashPattern {
                        dash_1: Some(2),
                        gap_1: Some(2),
                        ..Default::default()
                    },
                });
            }
            ops.push(Op::DrawLine {
                line: Line {
                    points: vec![point(*x1, *y, false), point(*x2, *y, false)],
                    is_closed: false,
                },
            });
            ops.push(Op::RestoreGraphicsState);
        }
        Element::Text(run) => render_text(ops, run, fonts),
        Element::Image {
            slot,
            x,
            y,
            width,
            height,
        } => {
            let Some(res) = images.get(slot) else {
                return;
            };
            // At dpi=72 printpdf renders 1 px = 1 pt, so
            // scale = desired_pt / px_dim.
            let scale_x = if res.px_width > 0 {
                width / res.px_width as f32
            } else {
                1.0
            };
            let scale_y = if res.px_height > 0 {
                height / res.px_height as f32
            } else {
                1.0
            };
            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(*x)),
                    translate_y: Some(Pt(*y)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }
}

fn render_text(ops: &mut Vec<Op>, run: &TextRun, fonts: &HashMap<FaceId, FontHandle>) {
    let handle = fonts
        .get(&run.face)
        .cloned()
        .unwrap_or(FontHandle::Builtin(BuiltinFont::Helvetica));

    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(run.x),
            y: Pt(run.baseline),
        },
    });
    ops.push(Op::SetFillColor {
        col: gray(run.gray),
    });
    match handle {
        FontHandle::Builtin(font) => {
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(run.font_size),
                font,
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(to_winlatin(&run.text))],
                font,
            });
        }
        FontHandle::Embedded(font) => {
            ops.push(Op::SetFontSize {
                size: Pt(run.font_size),
                font: font.clone(),
            });
            ops.push(Op::WriteText {
                items: vec![TextItem::Text(run.text.clone())],
                font,
            });
        }
    }
    ops.push(Op::EndTextSection);
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{201A}' => 0x82, // single low-9 quote
            '\u{201E}' => 0x84, // double low-9 quote
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{00A0}' => 0x20, // non-breaking space -> space
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0xFF; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_config::Stroke;

    #[test]
    fn render_empty_page() {
        let layout = WorksheetLayout::new("empty", 612.0, 792.0);
        let bytes = render_pdf(&layout, &FontRegistry::builtin(), &ImageAssets::none()).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        // PDF magic number
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn render_every_element_kind() {
        let mut layout = WorksheetLayout::new("elements", 612.0, 792.0);
        layout.elements = vec![
            Element::RoundedBox {
                x: 54.0,
                y: 500.0,
                width: 504.0,
                height: 80.0,
                radius: 8.0,
                fill_gray: Some(0.95),
                stroke: Some(Stroke::black(1.0)),
            },
            Element::Rect {
                x: 36.0,
                y: 36.0,
                width: 540.0,
                height: 720.0,
                stroke: Stroke {
                    width: 0.5,
                    gray: 0.8,
                },
            },
            Element::Rule {
                x1: 64.0,
                x2: 548.0,
                y: 450.0,
                stroke: Stroke::black(1.0),
                dashed: true,
            },
            Element::Text(TextRun {
                text: "“Trust in the Lord” — Proverbs 3:5".to_string(),
                x: 64.0,
                baseline: 560.0,
                face: FaceId::Cursive,
                font_size: 30.0,
                gray: 0.0,
            }),
            // no image loaded for this slot: skipped
            Element::Image {
                slot: ImageSlot::Logo,
                x: 54.0,
                y: 678.0,
                width: 50.0,
                height: 50.0,
            },
        ];
        let bytes = render_pdf(&layout, &FontRegistry::builtin(), &ImageAssets::none()).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn rounded_rect_closes_on_start() {
        let pts = rounded_rect_points(0.0, 0.0, 100.0, 50.0, 8.0);
        assert_eq!(pts.len(), 17);
        assert_eq!(pts.first().map(|p| (p.p.x, p.p.y)), pts.last().map(|p| (p.p.x, p.p.y)));
        assert_eq!(rounded_rect_points(0.0, 0.0, 100.0, 0.0, 8.0).len(), 4);
    }

    #[test]
    fn winlatin_maps_curly_quotes() {
        let s = to_winlatin("“a”");
        assert_eq!(s.as_bytes(), &[0x93, b'a', 0x94]);
        assert_eq!(to_winlatin("日").as_bytes(), b"?");
    }
}
