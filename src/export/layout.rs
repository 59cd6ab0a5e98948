//! Pagination of export elements onto fixed-size pages.
//!
//! Coordinates are in points with the origin at the top-left corner of the
//! page and `y` growing downwards. Text items are positioned by baseline.

use crate::document::Rgb;

use super::grammar::{ExportElement, ExportRun};
use super::metrics::Font;

const BODY_SIZE: f32 = 11.0;
const BODY_LINE_HEIGHT: f32 = 1.6;
const TITLE_SIZE: f32 = 24.0;
const HEADING_SIZE: f32 = 18.0;
const FORMULA_SIZE: f32 = 12.0;
const FORMULA_PADDING: f32 = 10.0;
const BULLET_GLYPH_SIZE: f32 = 10.0;
const BULLET_COLUMN: f32 = 15.0;
const FOOTER_SIZE: f32 = 10.0;
const FOOTER_BOTTOM: f32 = 30.0;
const IMAGE_MAX_WIDTH: f32 = 325.0;
const IMAGE_MAX_HEIGHT: f32 = 250.0;
const IMAGE_MARGIN: f32 = 15.0;
/// Line height of single-size text such as titles and formulas.
const TIGHT_LINE_HEIGHT: f32 = 1.2;

pub const FALLBACK_NOTICE: &str = "No content available to generate PDF.";
pub const RULE_COLOR: Rgb = Rgb::new(0xcc, 0xcc, 0xcc);
pub const FORMULA_BACKGROUND: Rgb = Rgb::new(0xf3, 0xf4, 0xf6);
pub const FOOTER_COLOR: Rgb = Rgb::new(0x80, 0x80, 0x80);
pub const TEXT_COLOR: Rgb = Rgb::new(0, 0, 0);

/// Page size and padding in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub padding_x: f32,
}

impl PageGeometry {
    pub const A4: Self = Self {
        width: 595.0,
        height: 842.0,
        padding_top: 35.0,
        padding_bottom: 65.0,
        padding_x: 35.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.padding_x
    }

    fn content_bottom(&self) -> f32 {
        self.height - self.padding_bottom
    }

    fn content_height(&self) -> f32 {
        self.content_bottom() - self.padding_top
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// Decoded source image, 8-bit RGB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedImageSource {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawItem {
    Text {
        x: f32,
        baseline: f32,
        font: Font,
        size: f32,
        color: Rgb,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Rgb,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Rgb,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

impl DrawItem {
    fn shifted(mut self, dy: f32) -> Self {
        match &mut self {
            Self::Text { baseline, .. } => *baseline += dy,
            Self::Rect { y, .. } | Self::Image { y, .. } => *y += dy,
            Self::Line { y1, y2, .. } => {
                *y1 += dy;
                *y2 += dy;
            }
        }
        self
    }

    /// Text content, if this is a text item.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub items: Vec<DrawItem>,
}

impl Page {
    /// All text on the page, one item per line of output.
    pub fn text_items(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(DrawItem::text)
    }
}

/// A laid-out line with items positioned relative to its own top edge.
#[derive(Debug, Clone, Default)]
struct LaidLine {
    height: f32,
    items: Vec<DrawItem>,
}

/// A laid-out element ready to be placed.
#[derive(Debug, Clone)]
struct LaidBlock {
    margin_top: f32,
    margin_bottom: f32,
    /// Kept on one page when it fits on one.
    atomic: bool,
    lines: Vec<LaidLine>,
    /// Backgrounds and rules positioned relative to the block top.
    decorations: Vec<DrawItem>,
}

impl LaidBlock {
    fn flowing(lines: Vec<LaidLine>, margin_top: f32, margin_bottom: f32) -> Self {
        Self {
            margin_top,
            margin_bottom,
            atomic: false,
            lines,
            decorations: Vec::new(),
        }
    }

    fn height(&self) -> f32 {
        self.lines.iter().map(|l| l.height).sum()
    }
}

struct Cursor<'a> {
    geometry: &'a PageGeometry,
    pages: Vec<Page>,
    y: f32,
    page_is_empty: bool,
}

impl<'a> Cursor<'a> {
    fn new(geometry: &'a PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::default()],
            y: geometry.padding_top,
            page_is_empty: true,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = self.geometry.padding_top;
        self.page_is_empty = true;
    }

    fn push(&mut self, item: DrawItem) {
        if let Some(page) = self.pages.last_mut() {
            page.items.push(item);
        }
        self.page_is_empty = false;
    }

    fn fits(&self, height: f32) -> bool {
        self.y + height <= self.geometry.content_bottom()
    }

    fn place(&mut self, block: LaidBlock) {
        if !self.page_is_empty {
            self.y += block.margin_top;
        }
        let height = block.height();
        let keep_together = block.atomic && height <= self.geometry.content_height();

        if keep_together {
            if !self.fits(height) && !self.page_is_empty {
                self.new_page();
            }
            let top = self.y;
            for item in block.decorations {
                self.push(item.shifted(top));
            }
            let mut y = top;
            for line in block.lines {
                for item in line.items {
                    self.push(item.shifted(y));
                }
                y += line.height;
            }
            self.y = y;
        } else {
            if block.atomic {
                tracing::debug!(height, "block taller than a page, splitting by line");
            }
            for line in block.lines {
                if !self.fits(line.height) && !self.page_is_empty {
                    self.new_page();
                }
                let top = self.y;
                for item in line.items {
                    self.push(item.shifted(top));
                }
                self.y += line.height;
            }
        }
        self.y += block.margin_bottom;
    }

    fn place_image(&mut self, image: &PlacedImageSource) {
        let (width, height) = fit_image(image.width, image.height);
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let x = (self.geometry.width - width) / 2.0;
        self.y += IMAGE_MARGIN;
        self.push(DrawItem::Image {
            x,
            y: self.y,
            width,
            height,
        });
        self.y += height + IMAGE_MARGIN;
    }
}

/// Scale pixel dimensions into the image box, never enlarging.
pub fn fit_image(width: u32, height: u32) -> (f32, f32) {
    if width == 0 || height == 0 {
        return (0.0, 0.0);
    }
    let (w, h) = (width as f32, height as f32);
    let scale = (IMAGE_MAX_WIDTH / w).min(IMAGE_MAX_HEIGHT / h).min(1.0);
    (w * scale, h * scale)
}

/// Lay out elements onto pages and number them.
///
/// The footer needs the page total, so it is added in a second pass once
/// every element has been placed.
pub fn paginate(
    elements: &[ExportElement],
    image: Option<&PlacedImageSource>,
    geometry: &PageGeometry,
) -> Vec<Page> {
    let _scope = crate::perf::scope("export.paginate");
    let mut cursor = Cursor::new(geometry);
    if let Some(image) = image {
        cursor.place_image(image);
    }
    for element in elements {
        cursor.place(lay_out(element, geometry));
    }

    let mut pages = cursor.pages;
    let total = pages.len();
    for (idx, page) in pages.iter_mut().enumerate() {
        let label = format!("{} / {}", idx + 1, total);
        let width = Font::Helvetica.measure(&label, FOOTER_SIZE);
        page.items.push(DrawItem::Text {
            x: (geometry.width - width) / 2.0,
            baseline: geometry.height - FOOTER_BOTTOM,
            font: Font::Helvetica,
            size: FOOTER_SIZE,
            color: FOOTER_COLOR,
            text: label,
        });
    }
    crate::perf::log_event(
        "export.paginate",
        format!("elements={} pages={total}", elements.len()),
    );
    pages
}

/// The single page produced when there is nothing to export.
pub fn fallback_page(geometry: &PageGeometry) -> Page {
    let size = 12.0;
    Page {
        items: vec![DrawItem::Text {
            x: geometry.padding_x,
            baseline: geometry.padding_top + size,
            font: Font::Helvetica,
            size,
            color: TEXT_COLOR,
            text: FALLBACK_NOTICE.to_string(),
        }],
    }
}

fn lay_out(element: &ExportElement, geometry: &PageGeometry) -> LaidBlock {
    let width = geometry.content_width();
    match element {
        ExportElement::Title(text) => {
            let runs = [ExportRun {
                text: text.clone(),
                bold: true,
                color: None,
            }];
            let mut lines = wrap_runs(&runs, TITLE_SIZE, TIGHT_LINE_HEIGHT, width);
            for line in &mut lines {
                center(line, geometry);
            }
            LaidBlock {
                atomic: true,
                ..LaidBlock::flowing(lines, 0.0, 20.0)
            }
        }
        ExportElement::Heading(runs) => {
            let bold: Vec<ExportRun> = runs
                .iter()
                .map(|r| ExportRun {
                    bold: true,
                    ..r.clone()
                })
                .collect();
            let mut lines = wrap_runs(&bold, HEADING_SIZE, TIGHT_LINE_HEIGHT, width);
            let text_height: f32 = lines.iter().map(|l| l.height).sum();
            // Padding below the text, then a rule.
            lines.push(LaidLine {
                height: 4.0,
                items: Vec::new(),
            });
            let rule_y = text_height + 3.0;
            LaidBlock {
                atomic: true,
                decorations: vec![DrawItem::Line {
                    x1: geometry.padding_x,
                    y1: rule_y,
                    x2: geometry.padding_x + width,
                    y2: rule_y,
                    width: 1.0,
                    color: RULE_COLOR,
                }],
                ..LaidBlock::flowing(lines, 10.0, 10.0)
            }
        }
        ExportElement::Paragraph(runs) => {
            let mut lines = wrap_runs(runs, BODY_SIZE, BODY_LINE_HEIGHT, width);
            indent(&mut lines, geometry.padding_x);
            LaidBlock::flowing(lines, 0.0, 10.0)
        }
        ExportElement::Bullet(runs) => {
            let mut lines = wrap_runs(runs, BODY_SIZE, BODY_LINE_HEIGHT, width - BULLET_COLUMN);
            indent(&mut lines, geometry.padding_x + BULLET_COLUMN);
            if let Some(first) = lines.first_mut() {
                first.items.push(DrawItem::Text {
                    x: geometry.padding_x,
                    baseline: baseline_in(first.height, BULLET_GLYPH_SIZE),
                    font: Font::Helvetica,
                    size: BULLET_GLYPH_SIZE,
                    color: TEXT_COLOR,
                    text: "\u{2022}".to_string(),
                });
            }
            LaidBlock {
                atomic: true,
                ..LaidBlock::flowing(lines, 0.0, 5.0)
            }
        }
        ExportElement::Formula(text) => {
            let mut lines = wrap_plain(
                text,
                Font::Courier,
                FORMULA_SIZE,
                width - 2.0 * FORMULA_PADDING,
            );
            indent(&mut lines, geometry.padding_x + FORMULA_PADDING);
            let text_height: f32 = lines.iter().map(|l| l.height).sum();
            lines.insert(
                0,
                LaidLine {
                    height: FORMULA_PADDING,
                    items: Vec::new(),
                },
            );
            lines.push(LaidLine {
                height: FORMULA_PADDING,
                items: Vec::new(),
            });
            LaidBlock {
                atomic: true,
                decorations: vec![DrawItem::Rect {
                    x: geometry.padding_x,
                    y: 0.0,
                    width,
                    height: text_height + 2.0 * FORMULA_PADDING,
                    fill: FORMULA_BACKGROUND,
                }],
                ..LaidBlock::flowing(lines, 10.0, 10.0)
            }
        }
        ExportElement::Rule => LaidBlock {
            atomic: true,
            lines: vec![LaidLine {
                height: 1.0,
                items: vec![DrawItem::Line {
                    x1: geometry.padding_x,
                    y1: 0.5,
                    x2: geometry.padding_x + width,
                    y2: 0.5,
                    width: 1.0,
                    color: RULE_COLOR,
                }],
            }],
            ..LaidBlock::flowing(Vec::new(), 10.0, 10.0)
        },
    }
}

fn baseline_in(line_height: f32, size: f32) -> f32 {
    (line_height - size) / 2.0 + size * 0.8
}

fn indent(lines: &mut [LaidLine], dx: f32) {
    for line in lines {
        for item in &mut line.items {
            if let DrawItem::Text { x, .. } = item {
                *x += dx;
            }
        }
    }
}

fn center(line: &mut LaidLine, geometry: &PageGeometry) {
    let used: f32 = line
        .items
        .iter()
        .map(|item| match item {
            DrawItem::Text {
                font, size, text, ..
            } => font.measure(text, *size),
            _ => 0.0,
        })
        .sum();
    let dx = geometry.padding_x + (geometry.content_width() - used).max(0.0) / 2.0;
    indent(std::slice::from_mut(line), dx);
}

/// Word-wrap styled runs into lines of at most `max_width` points.
/// Text items are positioned relative to x = 0.
fn wrap_runs(runs: &[ExportRun], size: f32, line_height: f32, max_width: f32) -> Vec<LaidLine> {
    let height = size * line_height;
    let baseline = baseline_in(height, size);
    let mut wrapper = Wrapper {
        lines: Vec::new(),
        current: LaidLine {
            height,
            items: Vec::new(),
        },
        cursor: 0.0,
        height,
        baseline,
        size,
        max_width,
    };

    for run in runs {
        let font = Font::regular_or_bold(run.bold);
        let color = run.color.unwrap_or(TEXT_COLOR);
        for piece in run.text.split_inclusive(' ') {
            wrapper.push_word(piece, font, color);
        }
    }
    wrapper.finish()
}

fn wrap_plain(text: &str, font: Font, size: f32, max_width: f32) -> Vec<LaidLine> {
    let height = size * TIGHT_LINE_HEIGHT;
    let mut wrapper = Wrapper {
        lines: Vec::new(),
        current: LaidLine {
            height,
            items: Vec::new(),
        },
        cursor: 0.0,
        height,
        baseline: baseline_in(height, size),
        size,
        max_width,
    };
    for piece in text.split_inclusive(' ') {
        wrapper.push_word(piece, font, TEXT_COLOR);
    }
    wrapper.finish()
}

struct Wrapper {
    lines: Vec<LaidLine>,
    current: LaidLine,
    cursor: f32,
    height: f32,
    baseline: f32,
    size: f32,
    max_width: f32,
}

impl Wrapper {
    fn at_line_start(&self) -> bool {
        self.current.items.is_empty()
    }

    fn break_line(&mut self) {
        let next = LaidLine {
            height: self.height,
            items: Vec::new(),
        };
        self.lines.push(std::mem::replace(&mut self.current, next));
        self.cursor = 0.0;
    }

    fn push_word(&mut self, piece: &str, font: Font, color: Rgb) {
        let word_width = font.measure(piece.trim_end_matches(' '), self.size);
        if !self.at_line_start() && self.cursor + word_width > self.max_width {
            self.break_line();
        }
        let piece = if self.at_line_start() {
            piece.trim_start_matches(' ')
        } else {
            piece
        };
        if piece.is_empty() {
            return;
        }

        if font.measure(piece.trim_end_matches(' '), self.size) > self.max_width {
            self.push_long_word(piece, font, color);
            return;
        }
        self.append(piece, font, color);
    }

    /// Hard-break a word wider than the line.
    fn push_long_word(&mut self, word: &str, font: Font, color: Rgb) {
        let mut chunk = String::new();
        for ch in word.chars() {
            let mut candidate = chunk.clone();
            candidate.push(ch);
            if !chunk.is_empty() && self.cursor + font.measure(&candidate, self.size) > self.max_width
            {
                self.append(&chunk, font, color);
                self.break_line();
                chunk.clear();
            }
            chunk.push(ch);
        }
        if !chunk.is_empty() {
            self.append(&chunk, font, color);
        }
    }

    fn append(&mut self, text: &str, font: Font, color: Rgb) {
        let width = font.measure(text, self.size);
        if let Some(DrawItem::Text {
            font: last_font,
            color: last_color,
            text: last_text,
            ..
        }) = self.current.items.last_mut()
            && *last_font == font
            && *last_color == color
        {
            last_text.push_str(text);
        } else {
            self.current.items.push(DrawItem::Text {
                x: self.cursor,
                baseline: self.baseline,
                font,
                size: self.size,
                color,
                text: text.to_string(),
            });
        }
        self.cursor += width;
    }

    fn finish(mut self) -> Vec<LaidLine> {
        if !self.current.items.is_empty() || self.lines.is_empty() {
            self.lines.push(self.current);
        }
        for line in &mut self.lines {
            if let Some(DrawItem::Text { text, .. }) = line.items.last_mut() {
                let trimmed = text.trim_end_matches(' ').len();
                text.truncate(trimmed);
            }
        }
        self.lines
    }
}
