//! Paginated document export.
//!
//! The exporter reads note text with its own line grammar, lays the
//! result out on A4 pages and serializes the pages as PDF. It has no
//! diagram support; diagram markup prints as ordinary paragraphs.

pub mod grammar;
pub mod layout;
mod metrics;
pub mod pdf;

use std::path::Path;

use thiserror::Error;

pub use grammar::{ExportElement, ExportRun, parse_export_lines};
pub use layout::{DrawItem, FALLBACK_NOTICE, Page, PageGeometry, PlacedImageSource, paginate};
pub use metrics::Font;
pub use pdf::write_pdf;

/// Default file name when a note has no subject.
pub const DEFAULT_FILE_NAME: &str = "note.pdf";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write document: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// A laid-out document ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub file_name: String,
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
    pub image: Option<PlacedImageSource>,
}

/// Lay out a note for export.
///
/// Absent or blank content produces a single page carrying
/// [`FALLBACK_NOTICE`] and no page number, so there is always something
/// to hand back.
pub fn export_note(
    content: Option<&str>,
    image: Option<PlacedImageSource>,
    subject: Option<&str>,
) -> ExportDocument {
    let geometry = PageGeometry::A4;
    let file_name = file_name_for(subject);

    let Some(content) = content.filter(|c| !c.trim().is_empty()) else {
        tracing::debug!("nothing to export, producing fallback page");
        return ExportDocument {
            file_name,
            geometry,
            pages: vec![layout::fallback_page(&geometry)],
            image: None,
        };
    };

    let elements = parse_export_lines(content);
    let pages = paginate(&elements, image.as_ref(), &geometry);
    ExportDocument {
        file_name,
        geometry,
        pages,
        image,
    }
}

/// Decode an image file for placement at the top of an export.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_image(path: &Path) -> Result<PlacedImageSource, ExportError> {
    let decoded = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?
        .to_rgb8();
    Ok(PlacedImageSource {
        width: decoded.width(),
        height: decoded.height(),
        rgb: decoded.into_raw(),
    })
}

/// `"{subject}.pdf"`, with characters that are unsafe in file names
/// replaced by `_`. Falls back to [`DEFAULT_FILE_NAME`].
pub fn file_name_for(subject: Option<&str>) -> String {
    let Some(subject) = subject.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_FILE_NAME.to_string();
    };
    let safe: String = subject
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("{safe}.pdf")
}
