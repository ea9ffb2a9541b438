//! Font registry and text measurement.
//!
//! Body and title text use the builtin Helvetica faces, measured from static
//! AFM tables. The two tracing faces (dotted print and dashed cursive) are
//! TrueType files loaded once at startup and measured with `ttf-parser`.
//! The registry is read-only after construction and shared by reference.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::afm::BuiltinFace;
use crate::error::{Result, WorksheetError};

pub const DOTTED_FONT_FILE: &str = "KGPrimaryDotsLined.ttf";
pub const CURSIVE_FONT_FILE: &str = "LearningCurveDashed-w4DP.ttf";

/// The faces a worksheet draws with.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceId {
    /// Paragraph text.
    Body,
    /// Titles, header and footer code.
    Bold,
    /// Dotted-guide print font for tracing.
    Dotted,
    /// Dashed cursive font for tracing.
    Cursive,
}

impl FaceId {
    pub fn is_tracing(self) -> bool {
        matches!(self, FaceId::Dotted | FaceId::Cursive)
    }
}

/// Metrics source for one face.
#[derive(Clone)]
pub enum FontData {
    Builtin(BuiltinFace),
    Embedded {
        family: String,
        /// Raw font bytes (kept alive for ttf-parser's zero-copy API).
        bytes: Vec<u8>,
        units_per_em: f32,
        ascender: f32,
    },
}

impl fmt::Debug for FontData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontData::Builtin(face) => f.debug_tuple("Builtin").field(face).finish(),
            FontData::Embedded { family, bytes, .. } => f
                .debug_struct("Embedded")
                .field("family", family)
                .field("bytes", &bytes.len())
                .finish(),
        }
    }
}

impl FontData {
    /// Parse a TrueType/OpenType font.
    pub fn from_bytes(family: &str, bytes: Vec<u8>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&bytes, 0).map_err(|e| {
            WorksheetError::Configuration(format!("failed to parse font `{family}`: {e}"))
        })?;
        let units_per_em = face.units_per_em() as f32;
        let ascender = face.ascender() as f32;
        Ok(FontData::Embedded {
            family: family.to_string(),
            bytes,
            units_per_em,
            ascender,
        })
    }

    /// Font bytes for embedding in the PDF, if this face is not builtin.
    pub fn embedded_bytes(&self) -> Option<&[u8]> {
        match self {
            FontData::Builtin(_) => None,
            FontData::Embedded { bytes, .. } => Some(bytes.as_slice()),
        }
    }
}

/// Locations of the mandatory tracing fonts.
#[derive(Debug, Clone)]
pub struct FontPaths {
    pub dotted: PathBuf,
    pub cursive: PathBuf,
}

impl FontPaths {
    /// The conventional file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dotted: dir.join(DOTTED_FONT_FILE),
            cursive: dir.join(CURSIVE_FONT_FILE),
        }
    }
}

/// Read-only registry of every face a worksheet needs.
#[derive(Debug, Clone)]
pub struct FontRegistry {
    dotted: FontData,
    cursive: FontData,
}

static BODY: FontData = FontData::Builtin(BuiltinFace::Helvetica);
static BOLD: FontData = FontData::Builtin(BuiltinFace::HelveticaBold);

impl FontRegistry {
    /// Registry with Helvetica metrics standing in for both tracing faces.
    /// Used by tests and by the `--builtin-fonts` CLI flag.
    pub fn builtin() -> Self {
        Self {
            dotted: FontData::Builtin(BuiltinFace::Helvetica),
            cursive: FontData::Builtin(BuiltinFace::Helvetica),
        }
    }

    /// Load both tracing faces. A missing or unparsable file is fatal.
    pub fn load(paths: &FontPaths) -> Result<Self> {
        let dotted = read_font("KGPrimaryDots", &paths.dotted)?;
        let cursive = read_font("LearningCurve", &paths.cursive)?;
        log::debug!(
            "loaded tracing fonts {} and {}",
            paths.dotted.display(),
            paths.cursive.display()
        );
        Ok(Self { dotted, cursive })
    }

    /// Replace one tracing face with a font parsed from `bytes`.
    pub fn load_font(&mut self, face: FaceId, family: &str, bytes: Vec<u8>) -> Result<()> {
        let data = FontData::from_bytes(family, bytes)?;
        match face {
            FaceId::Dotted => self.dotted = data,
            FaceId::Cursive => self.cursive = data,
            FaceId::Body | FaceId::Bold => {
                return Err(WorksheetError::Configuration(format!(
                    "{face:?} is a builtin face and cannot be replaced"
                )))
            }
        }
        Ok(())
    }

    pub fn get(&self, face: FaceId) -> &FontData {
        match face {
            FaceId::Body => &BODY,
            FaceId::Bold => &BOLD,
            FaceId::Dotted => &self.dotted,
            FaceId::Cursive => &self.cursive,
        }
    }

    /// Width of `text` in points.
    pub fn measure_text_width(&self, text: &str, face: FaceId, font_size: f32) -> f32 {
        match self.get(face) {
            FontData::Builtin(builtin) => builtin.string_width(text, font_size),
            FontData::Embedded {
                bytes,
                units_per_em,
                ..
            } => {
                // Parse the font and sum horizontal advances
                let Ok(parsed) = ttf_parser::Face::parse(bytes, 0) else {
                    return text.chars().count() as f32 * font_size * 0.5;
                };
                let scale = font_size / units_per_em;
                text.chars()
                    .map(|ch| match parsed.glyph_index(ch) {
                        Some(gid) => parsed.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        // Fallback for missing glyph
                        None => font_size * 0.5,
                    })
                    .sum()
            }
        }
    }

    /// Ascender in points.
    pub fn ascender_pt(&self, face: FaceId, font_size: f32) -> f32 {
        match self.get(face) {
            FontData::Builtin(builtin) => builtin.ascender() * font_size / 1000.0,
            FontData::Embedded {
                units_per_em,
                ascender,
                ..
            } => ascender * font_size / units_per_em,
        }
    }

    /// True when both tracing faces come from real font files.
    pub fn has_tracing_fonts(&self) -> bool {
        self.dotted.embedded_bytes().is_some() && self.cursive.embedded_bytes().is_some()
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn read_font(family: &str, path: &Path) -> Result<FontData> {
    let bytes = std::fs::read(path).map_err(|e| {
        WorksheetError::Configuration(format!(
            "required font `{family}` could not be read from {}: {e}",
            path.display()
        ))
    })?;
    FontData::from_bytes(family, bytes)
}

/// Greedy word wrap against measured widths.
///
/// Words are never split: a word wider than `max_width` sits alone on its
/// own line. Whitespace runs collapse to single spaces. Empty or blank
/// input produces no lines.
pub fn wrap_text(
    text: &str,
    face: FaceId,
    font_size: f32,
    max_width: f32,
    fonts: &FontRegistry,
) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line.push_str(word);
            continue;
        }
        let candidate = format!("{current_line} {word}");
        if fonts.measure_text_width(&candidate, face, font_size) > max_width {
            lines.push(std::mem::replace(&mut current_line, word.to_string()));
        } else {
            current_line = candidate;
        }
    }
    if !current_line.is_empty() {
        lines.push(current_line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERSE: &str = "Trust in the LORD with all your heart, and do not lean on \
        your own understanding. In all your ways acknowledge him, and he will make \
        straight your paths.";

    #[test]
    fn builtin_text_width() {
        let fonts = FontRegistry::builtin();
        // H=722 e=556 l=222 l=222 o=556 → 2278 units
        let w = fonts.measure_text_width("Hello", FaceId::Body, 10.0);
        assert!((w - 22.78).abs() < 0.01, "{w}");
        let bold = fonts.measure_text_width("Hello", FaceId::Bold, 10.0);
        assert!(bold > w);
    }

    #[test]
    fn word_wrap_basic() {
        let fonts = FontRegistry::builtin();
        let lines = wrap_text("Hello world foo bar", FaceId::Body, 16.0, 60.0, &fonts);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
    }

    #[test]
    fn wrapped_lines_fit_budget() {
        let fonts = FontRegistry::builtin();
        for budget in [80.0, 150.0, 300.0, 464.0] {
            let lines = wrap_text(VERSE, FaceId::Dotted, 30.0, budget, &fonts);
            for line in &lines {
                let w = fonts.measure_text_width(line, FaceId::Dotted, 30.0);
                let single_word = !line.contains(' ');
                assert!(
                    w <= budget || single_word,
                    "line {line:?} is {w}pt wide, budget {budget}"
                );
            }
        }
    }

    #[test]
    fn wrapping_preserves_words() {
        let fonts = FontRegistry::builtin();
        let messy = "  For   God\tso\nloved  the world ";
        let lines = wrap_text(messy, FaceId::Body, 10.0, 30.0, &fonts);
        let normalized: Vec<&str> = messy.split_whitespace().collect();
        assert_eq!(lines.join(" "), normalized.join(" "));

        let lines = wrap_text(VERSE, FaceId::Body, 10.0, 200.0, &fonts);
        assert_eq!(lines.join(" "), VERSE.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn oversized_word_stands_alone() {
        let fonts = FontRegistry::builtin();
        let lines = wrap_text(
            "a Mahershalalhashbaz b",
            FaceId::Body,
            30.0,
            60.0,
            &fonts,
        );
        assert_eq!(lines, vec!["a", "Mahershalalhashbaz", "b"]);
    }

    #[test]
    fn empty_input_has_no_lines() {
        let fonts = FontRegistry::builtin();
        assert!(wrap_text("", FaceId::Body, 10.0, 100.0, &fonts).is_empty());
        assert!(wrap_text("   \n ", FaceId::Body, 10.0, 100.0, &fonts).is_empty());
    }

    #[test]
    fn missing_font_file_is_configuration_error() {
        let paths = FontPaths::in_dir(Path::new("/definitely/not/here"));
        let err = FontRegistry::load(&paths).unwrap_err();
        assert!(matches!(err, WorksheetError::Configuration(_)), "{err}");
        assert!(err.to_string().contains("KGPrimaryDots"));
    }

    #[test]
    fn garbage_font_bytes_are_rejected() {
        let mut fonts = FontRegistry::builtin();
        let err = fonts
            .load_font(FaceId::Cursive, "Broken", vec![0, 1, 2, 3])
            .unwrap_err();
        assert!(matches!(err, WorksheetError::Configuration(_)));
        assert!(!fonts.has_tracing_fonts());
    }
}
