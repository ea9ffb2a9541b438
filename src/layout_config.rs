//! Layout config – the intermediate representation between layout computation
//! and PDF rendering. This is the "frozen" structure that encodes exactly what
//! goes on the page.
//!
//! Coordinates are PDF points with the origin at the bottom-left of the
//! page, so the layout cursor moves toward zero as boxes stack downward.

use serde::{Deserialize, Serialize};

use crate::assets::ImageSlot;
use crate::fonts::FaceId;

/// A complete single-page worksheet ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksheetLayout {
    /// Document title embedded in the PDF metadata.
    #[serde(default = "WorksheetLayout::default_title")]
    pub title: String,
    /// Width of the page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of the page in PDF points.
    pub page_height_pt: f32,
    /// Drawing operations in paint order.
    pub elements: Vec<Element>,
    /// Named page regions, in the order they were laid out.
    pub regions: Vec<Region>,
    #[serde(default)]
    pub warnings: Vec<LayoutWarning>,
}

/// One drawing operation. `y` is always the bottom edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    RoundedBox {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        fill_gray: Option<f32>,
        stroke: Option<Stroke>,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        stroke: Stroke,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        stroke: Stroke,
        dashed: bool,
    },
    Text(TextRun),
    Image {
        slot: ImageSlot,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub width: f32,
    /// 0.0 = black, 1.0 = white.
    pub gray: f32,
}

impl Stroke {
    pub const fn black(width: f32) -> Self {
        Self { width, gray: 0.0 }
    }
}

/// A single line of text positioned by its baseline origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub face: FaceId,
    pub font_size: f32,
    pub gray: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Header,
    Verse,
    Tracing,
    Handwriting,
    Reflection,
    ColoringLabel,
    ColoringArea,
    Footer,
}

/// The rectangle a box occupies, recorded for inspection and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub kind: RegionKind,
    pub x: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub fn bottom(&self) -> f32 {
        self.top - self.height
    }

    /// Whether a point lies inside the region (edges included).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y <= self.top && y >= self.bottom()
    }
}

/// Non-fatal layout problems. The page is rendered anyway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutWarning {
    /// A region extends below the bottom margin.
    Overflow {
        region: RegionKind,
        bottom: f32,
        limit: f32,
    },
    /// The coloring label needs more height than the capped row provides.
    ColoringLabelClipped { needed: f32, available: f32 },
}

impl WorksheetLayout {
    pub fn new(title: &str, page_width_pt: f32, page_height_pt: f32) -> Self {
        Self {
            title: title.to_string(),
            page_width_pt,
            page_height_pt,
            elements: Vec::new(),
            regions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn default_title() -> String {
        "Bible Copywork Worksheet".to_string()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn region(&self, kind: RegionKind) -> Option<&Region> {
        self.regions.iter().find(|r| r.kind == kind)
    }

    /// Text runs whose baseline origin falls inside `kind`'s region.
    pub fn text_in(&self, kind: RegionKind) -> Vec<&TextRun> {
        let Some(region) = self.region(kind) else {
            return Vec::new();
        };
        self.elements
            .iter()
            .filter_map(|e| match e {
                Element::Text(run) if region.contains(run.x, run.baseline) => Some(run),
                _ => None,
            })
            .collect()
    }

    /// Horizontal rules drawn inside `kind`'s region.
    pub fn rules_in(&self, kind: RegionKind) -> Vec<&Element> {
        let Some(region) = self.region(kind) else {
            return Vec::new();
        };
        self.elements
            .iter()
            .filter(|e| matches!(e, Element::Rule { x1, y, .. } if region.contains(*x1, *y)))
            .collect()
    }

    pub fn has_overflow(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, LayoutWarning::Overflow { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WorksheetLayout {
        let mut layout = WorksheetLayout::new("Worksheet", 612.0, 792.0);
        layout.regions.push(Region {
            kind: RegionKind::Verse,
            x: 54.0,
            top: 600.0,
            width: 504.0,
            height: 70.0,
        });
        layout.elements.push(Element::Text(TextRun {
            text: "Inside".to_string(),
            x: 64.0,
            baseline: 570.0,
            face: FaceId::Body,
            font_size: 10.0,
            gray: 0.0,
        }));
        layout.elements.push(Element::Text(TextRun {
            text: "Outside".to_string(),
            x: 64.0,
            baseline: 500.0,
            face: FaceId::Body,
            font_size: 10.0,
            gray: 0.0,
        }));
        layout
    }

    #[test]
    fn json_round_trip() {
        let layout = sample();
        let parsed = WorksheetLayout::from_json(&layout.to_json()).unwrap();
        assert_eq!(parsed, layout);
    }

    #[test]
    fn text_is_selected_by_region() {
        let layout = sample();
        let texts: Vec<&str> = layout
            .text_in(RegionKind::Verse)
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Inside"]);
        assert!(layout.text_in(RegionKind::Tracing).is_empty());
    }

    #[test]
    fn region_bottom() {
        let layout = sample();
        let verse = layout.region(RegionKind::Verse).unwrap();
        assert_eq!(verse.bottom(), 530.0);
        assert!(verse.contains(54.0, 530.0));
        assert!(!verse.contains(53.9, 560.0));
    }
}
