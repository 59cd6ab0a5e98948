//! Note content parsing.
//!
//! This module handles:
//! - Extracting diagram payloads in all accepted notations
//! - Classifying lines into headings, bullets, formulas, rules and paragraphs
//! - Splitting text into styled runs (bold, semantic color spans)

mod inline;
mod parser;
mod types;

pub use inline::split_runs;
pub use parser::parse;
pub use types::{
    Block, ColorTag, DisplayOptions, Emphasis, FontStyle, PaperStyle, Rgb, StyledRun,
    runs_to_string,
};

/// Parse optional note content. Absent content yields no blocks.
pub fn parse_optional(content: Option<&str>) -> Vec<Block> {
    content.map(parse).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optional_none_is_empty() {
        assert!(parse_optional(None).is_empty());
    }

    #[test]
    fn test_parse_optional_some_parses() {
        let blocks = parse_optional(Some("## Section"));
        assert_eq!(blocks.len(), 1);
    }
}
