//! Glyph width estimates for the three built-in PDF fonts.

use unicode_width::UnicodeWidthChar;

/// Advance widths (1/1000 em) for ASCII 32..=126.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const COURIER: u16 = 600;
const FALLBACK: u16 = 556;
const WIDE: u16 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Helvetica,
    HelveticaBold,
    Courier,
}

impl Font {
    pub const fn regular_or_bold(bold: bool) -> Self {
        if bold { Self::HelveticaBold } else { Self::Helvetica }
    }

    /// Base-14 font name.
    pub const fn base_name(self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::Courier => "Courier",
        }
    }

    /// Resource name used inside page content streams.
    pub const fn resource(self) -> &'static str {
        match self {
            Self::Helvetica => "F1",
            Self::HelveticaBold => "F2",
            Self::Courier => "F3",
        }
    }

    fn advance(self, ch: char) -> u16 {
        if self == Self::Courier {
            return COURIER;
        }
        let code = ch as u32;
        if (32..=126).contains(&code) {
            let table = if self == Self::HelveticaBold {
                &HELVETICA_BOLD
            } else {
                &HELVETICA
            };
            return table[(code - 32) as usize];
        }
        match ch.width() {
            Some(2) => WIDE,
            Some(0) => 0,
            _ => FALLBACK,
        }
    }

    /// Width of `text` in points at `size`.
    pub fn measure(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.advance(c))).sum();
        units as f32 * size / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_courier_is_monospaced() {
        assert!((Font::Courier.measure("iiii", 10.0) - 24.0).abs() < f32::EPSILON);
        assert!((Font::Courier.measure("MMMM", 10.0) - 24.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bold_is_wider_than_regular() {
        let text = "Photosynthesis";
        assert!(Font::HelveticaBold.measure(text, 11.0) > Font::Helvetica.measure(text, 11.0));
    }

    #[test]
    fn test_wide_characters_take_a_full_em() {
        assert!((Font::Helvetica.measure("漢", 10.0) - 10.0).abs() < f32::EPSILON);
    }
}
