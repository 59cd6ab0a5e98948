//! Core note content types.

/// One structurally classified unit of note content.
///
/// Blocks are derived fresh from the note text on every parse and are
/// never cached or mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A fenced or tagged diagram payload (trimmed source text).
    Diagram { source: String },
    /// Heading with level 1 (title), 2 (section) or 3 (subsection).
    Heading {
        level: u8,
        text: String,
        runs: Vec<StyledRun>,
    },
    /// A paragraph made of styled runs.
    Paragraph { runs: Vec<StyledRun> },
    /// A single list item. Consecutive bullets form one list when rendered.
    Bullet { runs: Vec<StyledRun> },
    /// A formula payload, shown in a fixed-width container.
    Formula { text: String },
    /// Horizontal separator.
    Rule,
}

impl Block {
    /// Plain text of the block with all markup removed.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Diagram { source } => source.clone(),
            Self::Heading { runs, .. } | Self::Paragraph { runs } | Self::Bullet { runs } => {
                runs_to_string(runs)
            }
            Self::Formula { text } => text.clone(),
            Self::Rule => String::new(),
        }
    }

    pub const fn is_bullet(&self) -> bool {
        matches!(self, Self::Bullet { .. })
    }
}

/// Weight of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Emphasis {
    #[default]
    None,
    Bold,
}

/// Semantic highlight carried by a color span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ColorTag {
    #[default]
    None,
    /// Important concepts and warnings (red).
    Critical,
    /// Definitions and key terms (green).
    Definition,
    /// Examples and tips (orange).
    Example,
}

impl ColorTag {
    /// Map a CSS color value to a tag.
    ///
    /// Accepts `#RRGGBB` (case-insensitive, `#` optional) and
    /// `rgb(r, g, b)`. Anything else is `ColorTag::None`.
    pub fn from_css(value: &str) -> Self {
        let value = value.trim();
        if let Some(rgb) = parse_rgb_function(value) {
            return Self::from_rgb(rgb);
        }
        let hex = value.strip_prefix('#').unwrap_or(value);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Self::None;
        }
        match hex.to_ascii_lowercase().as_str() {
            "dc2626" => Self::Critical,
            "059669" => Self::Definition,
            "d97706" => Self::Example,
            _ => Self::None,
        }
    }

    const fn from_rgb(rgb: Rgb) -> Self {
        match (rgb.r, rgb.g, rgb.b) {
            (220, 38, 38) => Self::Critical,
            (5, 150, 105) => Self::Definition,
            (217, 119, 6) => Self::Example,
            _ => Self::None,
        }
    }

    /// Presentation color for the tag.
    pub const fn rgb(self) -> Option<Rgb> {
        match self {
            Self::None => None,
            Self::Critical => Some(Rgb::new(0xdc, 0x26, 0x26)),
            Self::Definition => Some(Rgb::new(0x05, 0x96, 0x69)),
            Self::Example => Some(Rgb::new(0xd9, 0x77, 0x06)),
        }
    }
}

/// RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Components scaled to `0.0..=1.0`.
    pub fn unit(self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }
}

fn parse_rgb_function(value: &str) -> Option<Rgb> {
    let inner = value
        .strip_prefix("rgb(")
        .or_else(|| value.strip_prefix("RGB("))?
        .strip_suffix(')')?;
    let mut parts = inner.split(',').map(|p| p.trim().parse::<u8>());
    let r = parts.next()?.ok()?;
    let g = parts.next()?.ok()?;
    let b = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Rgb::new(r, g, b))
}

/// A contiguous span of text with emphasis and color metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub emphasis: Emphasis,
    pub color: ColorTag,
}

impl StyledRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasis: Emphasis::None,
            color: ColorTag::None,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasis: Emphasis::Bold,
            color: ColorTag::None,
        }
    }

    #[must_use]
    pub const fn with_color(mut self, color: ColorTag) -> Self {
        self.color = color;
        self
    }

    pub const fn is_bold(&self) -> bool {
        matches!(self.emphasis, Emphasis::Bold)
    }
}

/// Concatenate the text of a run sequence.
pub fn runs_to_string(runs: &[StyledRun]) -> String {
    let mut content = String::new();
    for run in runs {
        content.push_str(&run.text);
    }
    content
}

/// Typography choice. Affects presentation only, never parsing.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontStyle {
    #[default]
    #[value(name = "handwritten-1", alias = "kalam")]
    Handwritten1,
    #[value(name = "handwritten-2", alias = "caveat")]
    Handwritten2,
    #[value(name = "handwritten-3", alias = "indie")]
    Handwritten3,
    System,
}

impl FontStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "handwritten-1" | "kalam" => Some(Self::Handwritten1),
            "handwritten-2" | "caveat" => Some(Self::Handwritten2),
            "handwritten-3" | "indie" => Some(Self::Handwritten3),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Handwritten1 => "handwritten-1",
            Self::Handwritten2 => "handwritten-2",
            Self::Handwritten3 => "handwritten-3",
            Self::System => "system",
        }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Handwritten1 => Self::Handwritten2,
            Self::Handwritten2 => Self::Handwritten3,
            Self::Handwritten3 => Self::System,
            Self::System => Self::Handwritten1,
        }
    }
}

/// Background decoration.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaperStyle {
    #[default]
    Plain,
    Lined,
    Grid,
}

impl PaperStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "plain" => Some(Self::Plain),
            "lined" => Some(Self::Lined),
            "grid" => Some(Self::Grid),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Lined => "lined",
            Self::Grid => "grid",
        }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Plain => Self::Lined,
            Self::Lined => Self::Grid,
            Self::Grid => Self::Plain,
        }
    }
}

/// Options that shape how a note is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub show_diagrams: bool,
    pub font_style: FontStyle,
    pub paper_style: PaperStyle,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_diagrams: true,
            font_style: FontStyle::default(),
            paper_style: PaperStyle::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_tag_from_hex() {
        assert_eq!(ColorTag::from_css("#dc2626"), ColorTag::Critical);
        assert_eq!(ColorTag::from_css("#059669"), ColorTag::Definition);
        assert_eq!(ColorTag::from_css("#D97706"), ColorTag::Example);
        assert_eq!(ColorTag::from_css("d97706"), ColorTag::Example);
    }

    #[test]
    fn test_color_tag_from_rgb_function() {
        assert_eq!(ColorTag::from_css("rgb(220, 38, 38)"), ColorTag::Critical);
        assert_eq!(ColorTag::from_css("rgb(5,150,105)"), ColorTag::Definition);
        assert_eq!(ColorTag::from_css("rgb(217, 119, 6)"), ColorTag::Example);
    }

    #[test]
    fn test_color_tag_unknown_values() {
        assert_eq!(ColorTag::from_css("#123456"), ColorTag::None);
        assert_eq!(ColorTag::from_css("red"), ColorTag::None);
        assert_eq!(ColorTag::from_css("#dc26"), ColorTag::None);
        assert_eq!(ColorTag::from_css("rgb(220, 38)"), ColorTag::None);
        assert_eq!(ColorTag::from_css("rgb(220, 38, 38, 1)"), ColorTag::None);
    }

    #[test]
    fn test_color_tag_presentation_colors() {
        assert_eq!(ColorTag::Critical.rgb(), Some(Rgb::new(220, 38, 38)));
        assert_eq!(ColorTag::Definition.rgb(), Some(Rgb::new(5, 150, 105)));
        assert_eq!(ColorTag::Example.rgb(), Some(Rgb::new(217, 119, 6)));
        assert_eq!(ColorTag::None.rgb(), None);
    }

    #[test]
    fn test_block_plain_text_joins_runs() {
        let block = Block::Paragraph {
            runs: vec![StyledRun::plain("a "), StyledRun::bold("b")],
        };
        assert_eq!(block.plain_text(), "a b");
        assert_eq!(Block::Rule.plain_text(), "");
    }

    #[test]
    fn test_font_and_paper_cycle_back() {
        let mut font = FontStyle::Handwritten1;
        for _ in 0..4 {
            font = font.next();
        }
        assert_eq!(font, FontStyle::Handwritten1);
        assert_eq!(PaperStyle::Grid.next(), PaperStyle::Plain);
    }

    #[test]
    fn test_font_style_accepts_legacy_names() {
        assert_eq!(FontStyle::parse("caveat"), Some(FontStyle::Handwritten2));
        assert_eq!(FontStyle::parse("handwritten-3"), Some(FontStyle::Handwritten3));
        assert_eq!(FontStyle::parse("comic"), None);
    }
}
