//! Minimal PDF 1.4 serialization of laid-out pages.
//!
//! Only what the layout produces is supported: base-14 text in WinAnsi
//! encoding, filled rectangles, stroked lines and one RGB image.

use std::fmt::Write as _;
use std::io::Write;

use crate::document::Rgb;

use super::ExportDocument;
use super::ExportError;
use super::layout::{DrawItem, PageGeometry};
use super::metrics::Font;

const FONTS: [Font; 3] = [Font::Helvetica, Font::HelveticaBold, Font::Courier];
const IMAGE_RESOURCE: &str = "Im1";

/// Serialize `document` as a PDF file.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_pdf(document: &ExportDocument, out: &mut impl Write) -> Result<(), ExportError> {
    let _scope = crate::perf::scope("export.write_pdf");
    let bytes = render_pdf(document);
    out.write_all(&bytes)?;
    out.flush()?;
    Ok(())
}

/// Serialize `document` into an in-memory PDF file.
pub fn render_pdf(document: &ExportDocument) -> Vec<u8> {
    let geometry = document.geometry;
    let mut pdf = PdfBuilder::default();

    // Fixed object numbers: catalog, page tree, fonts, optional image.
    let catalog_id = pdf.reserve();
    let pages_id = pdf.reserve();
    let font_ids: Vec<usize> = FONTS
        .iter()
        .map(|font| {
            pdf.object(format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.base_name()
            ))
        })
        .collect();
    let image_id = document.image.as_ref().map(|image| {
        let header = format!(
            "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB \
             /BitsPerComponent 8 /Length {} >>",
            image.width,
            image.height,
            image.rgb.len()
        );
        pdf.stream_object(&header, &image.rgb)
    });

    let mut resources = String::from("<< /Font <<");
    for (font, id) in FONTS.iter().zip(&font_ids) {
        let _ = write!(resources, " /{} {id} 0 R", font.resource());
    }
    resources.push_str(" >>");
    if let Some(id) = image_id {
        let _ = write!(resources, " /XObject << /{IMAGE_RESOURCE} {id} 0 R >>");
    }
    resources.push_str(" >>");

    let mut page_ids = Vec::with_capacity(document.pages.len());
    for page in &document.pages {
        let content = content_stream(&page.items, &geometry);
        let header = format!("<< /Length {} >>", content.len());
        let content_id = pdf.stream_object(&header, content.as_bytes());
        let page_id = pdf.object(format!(
            "<< /Type /Page /Parent {pages_id} 0 R /MediaBox [0 0 {} {}] /Resources {resources} \
             /Contents {content_id} 0 R >>",
            num(geometry.width),
            num(geometry.height)
        ));
        page_ids.push(page_id);
    }

    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    pdf.fill(
        pages_id,
        format!(
            "<< /Type /Pages /Kids [{kids}] /Count {} >>",
            page_ids.len()
        ),
    );
    pdf.fill(
        catalog_id,
        format!("<< /Type /Catalog /Pages {pages_id} 0 R >>"),
    );
    pdf.finish(catalog_id)
}

fn content_stream(items: &[DrawItem], geometry: &PageGeometry) -> String {
    let height = geometry.height;
    let mut out = String::new();
    for item in items {
        match item {
            DrawItem::Text {
                x,
                baseline,
                font,
                size,
                color,
                text,
            } => {
                let _ = writeln!(
                    out,
                    "BT /{} {} Tf {} rg {} {} Td ({}) Tj ET",
                    font.resource(),
                    num(*size),
                    rgb(*color),
                    num(*x),
                    num(height - baseline),
                    escape(text)
                );
            }
            DrawItem::Rect {
                x,
                y,
                width,
                height: h,
                fill,
            } => {
                let _ = writeln!(
                    out,
                    "{} rg {} {} {} {} re f",
                    rgb(*fill),
                    num(*x),
                    num(height - y - h),
                    num(*width),
                    num(*h)
                );
            }
            DrawItem::Line {
                x1,
                y1,
                x2,
                y2,
                width,
                color,
            } => {
                let _ = writeln!(
                    out,
                    "{} RG {} w {} {} m {} {} l S",
                    rgb(*color),
                    num(*width),
                    num(*x1),
                    num(height - y1),
                    num(*x2),
                    num(height - y2)
                );
            }
            DrawItem::Image {
                x,
                y,
                width,
                height: h,
            } => {
                let _ = writeln!(
                    out,
                    "q {} 0 0 {} {} {} cm /{IMAGE_RESOURCE} Do Q",
                    num(*width),
                    num(*h),
                    num(*x),
                    num(height - y - h)
                );
            }
        }
    }
    out
}

fn num(value: f32) -> String {
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn rgb(color: Rgb) -> String {
    let (r, g, b) = color.unit();
    format!("{} {} {}", num(r), num(g), num(b))
}

/// Map a character to its WinAnsi byte, `?` when it has none.
fn win_ansi(ch: char) -> u8 {
    match ch {
        '\u{20}'..='\u{7e}' => ch as u8,
        '\u{a0}'..='\u{ff}' => ch as u32 as u8,
        '\u{20ac}' => 0x80,
        '\u{2026}' => 0x85,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{2122}' => 0x99,
        _ => b'?',
    }
}

/// Encode text as the body of a PDF literal string.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match win_ansi(ch) {
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\\' => out.push_str("\\\\"),
            byte @ 0x20..=0x7e => out.push(char::from(byte)),
            byte => {
                let _ = write!(out, "\\{byte:03o}");
            }
        }
    }
    out
}

/// Accumulates numbered objects and their byte offsets.
#[derive(Default)]
struct PdfBuilder {
    body: Vec<u8>,
    /// Offset of each object, by object number minus one.
    offsets: Vec<Option<usize>>,
    /// Objects reserved before their content was known.
    deferred: Vec<(usize, String)>,
}

impl PdfBuilder {
    fn reserve(&mut self) -> usize {
        self.offsets.push(None);
        self.offsets.len()
    }

    fn object(&mut self, dict: String) -> usize {
        let id = self.reserve();
        self.write_object(id, dict.as_bytes(), None);
        id
    }

    fn stream_object(&mut self, header: &str, data: &[u8]) -> usize {
        let id = self.reserve();
        self.write_object(id, header.as_bytes(), Some(data));
        id
    }

    fn fill(&mut self, id: usize, dict: String) {
        self.deferred.push((id, dict));
    }

    fn write_object(&mut self, id: usize, dict: &[u8], stream: Option<&[u8]>) {
        self.offsets[id - 1] = Some(self.body.len());
        self.body.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        self.body.extend_from_slice(dict);
        if let Some(data) = stream {
            self.body.extend_from_slice(b"\nstream\n");
            self.body.extend_from_slice(data);
            self.body.extend_from_slice(b"\nendstream");
        }
        self.body.extend_from_slice(b"\nendobj\n");
    }

    fn finish(mut self, root: usize) -> Vec<u8> {
        for (id, dict) in std::mem::take(&mut self.deferred) {
            self.write_object(id, dict.as_bytes(), None);
        }

        let header = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n";
        let mut out = Vec::with_capacity(header.len() + self.body.len() + 256);
        out.extend_from_slice(header);
        out.extend_from_slice(&self.body);

        let xref_offset = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", self.offsets.len() + 1);
        for offset in &self.offsets {
            let offset = offset.map_or(0, |o| o + header.len());
            let _ = writeln!(xref, "{offset:010} 00000 n ");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root {root} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            self.offsets.len() + 1
        );
        out.extend_from_slice(xref.as_bytes());
        out
    }
}
