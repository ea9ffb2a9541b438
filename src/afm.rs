//! Advance widths for the two builtin PDF faces the worksheet uses.
//!
//! Values are the standard Adobe AFM widths in 1/1000 em. Index =
//! `(char as usize) - 32`, covering 0x20 (space) through 0x7E (~).

/// Which builtin face a table describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFace {
    Helvetica,
    HelveticaBold,
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

impl BuiltinFace {
    /// Advance width of `ch` in 1/1000 em.
    pub fn advance(self, ch: char) -> u16 {
        let code = ch as usize;
        if (32..=126).contains(&code) {
            return match self {
                BuiltinFace::Helvetica => HELVETICA[code - 32],
                BuiltinFace::HelveticaBold => HELVETICA_BOLD[code - 32],
            };
        }
        let bold = self == BuiltinFace::HelveticaBold;
        // WinAnsi glyphs that show up in verse text.
        match (ch, bold) {
            ('\u{2018}' | '\u{2019}' | '\u{201A}', false) => 222,
            ('\u{2018}' | '\u{2019}' | '\u{201A}', true) => 278,
            ('\u{201C}' | '\u{201D}' | '\u{201E}', false) => 333,
            ('\u{201C}' | '\u{201D}' | '\u{201E}', true) => 500,
            ('\u{2013}', _) => 556,
            ('\u{2014}' | '\u{2026}', _) => 1000,
            ('\u{2022}', _) => 350,
            ('\u{00B7}' | '\u{00A0}', _) => 278,
            ('\u{00A9}', _) => 737,
            _ => 556,
        }
    }

    /// Width of `text` in points at `font_size`.
    pub fn string_width(self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.advance(c) as u32).sum();
        units as f32 * font_size / 1000.0
    }

    pub fn ascender(self) -> f32 {
        718.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_widths() {
        assert_eq!(BuiltinFace::Helvetica.advance(' '), 278);
        assert_eq!(BuiltinFace::Helvetica.advance('W'), 944);
        assert_eq!(BuiltinFace::HelveticaBold.advance('m'), 889);
        assert_eq!(BuiltinFace::Helvetica.advance('~'), 584);
    }

    #[test]
    fn string_width_scales_with_size() {
        // "Hi" = 722 + 222
        let w = BuiltinFace::Helvetica.string_width("Hi", 10.0);
        assert!((w - 9.44).abs() < 1e-3, "{w}");
        let w = BuiltinFace::Helvetica.string_width("Hi", 20.0);
        assert!((w - 18.88).abs() < 1e-3, "{w}");
    }

    #[test]
    fn curly_quotes_have_widths() {
        assert_eq!(BuiltinFace::Helvetica.advance('“'), 333);
        assert_eq!(BuiltinFace::HelveticaBold.advance('’'), 278);
    }
}
