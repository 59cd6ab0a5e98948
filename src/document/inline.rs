//! Inline run splitting: color spans and `**bold**` pairs.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{ColorTag, Emphasis, StyledRun};

/// An HTML-like span with a quoted style attribute. Non-greedy to the
/// first closing tag, so nested spans are not supported.
static SPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<span\s+style\s*=\s*(?:"([^"]*)"|'([^']*)')\s*>(.*?)</span>"#)
        .expect("span pattern is valid")
});

/// `color:` declaration inside a style attribute. Anchored on `;` so
/// `background-color` never matches.
static COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*color\s*:\s*([^;]+)").expect("color pattern is valid")
});

static WEIGHT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*font-weight\s*:\s*(?:bold|bolder|[6-9]00)\b")
        .expect("weight pattern is valid")
});

/// Split a line of note text into styled runs.
///
/// Color spans are cut out first; everything else, including each span's
/// own content, is then split on `**` pairs. Markup that does not close is
/// kept as literal text. Empty runs are dropped.
pub fn split_runs(text: &str) -> Vec<StyledRun> {
    let mut runs = Vec::new();
    let mut last = 0;

    for caps in SPAN_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let style = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        let Some(color_value) = COLOR_RE.captures(style).and_then(|c| c.get(1)) else {
            // Not a color span; leave it for the bold pass as literal text.
            continue;
        };
        let content = caps.get(3).map_or("", |m| m.as_str());

        push_bold_runs(&text[last..whole.start()], ColorTag::None, false, &mut runs);

        let color = ColorTag::from_css(color_value.as_str());
        let bold_all = color != ColorTag::None || WEIGHT_RE.is_match(style);
        push_bold_runs(content, color, bold_all, &mut runs);
        last = whole.end();
    }

    push_bold_runs(&text[last..], ColorTag::None, false, &mut runs);
    runs
}

fn push_bold_runs(text: &str, color: ColorTag, bold_all: bool, runs: &mut Vec<StyledRun>) {
    let mut rest = text;
    while let Some(open) = rest.find("**") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("**") else {
            break;
        };
        push_run(&rest[..open], bold_all, color, runs);
        push_run(&after[..close], true, color, runs);
        rest = &after[close + 2..];
    }
    push_run(rest, bold_all, color, runs);
}

fn push_run(text: &str, bold: bool, color: ColorTag, runs: &mut Vec<StyledRun>) {
    if text.is_empty() {
        return;
    }
    runs.push(StyledRun {
        text: text.to_string(),
        emphasis: if bold { Emphasis::Bold } else { Emphasis::None },
        color,
    });
}
