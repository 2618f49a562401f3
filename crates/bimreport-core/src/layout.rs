//! Word wrapping and pagination of report text onto fixed-size pages.
//!
//! Coordinates are in the page's layout unit (millimetres for the default
//! A4 setup) with the origin at the top-left corner and `y` growing downward.

use crate::error::EmissionError;
use crate::metrics::TextMeasure;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub line_height: f64,
    pub font_size_pt: f64,
}

impl PageSetup {
    pub fn a4() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin: 15.0,
            line_height: 6.0,
            font_size_pt: 12.0,
        }
    }

    pub fn content_width(&self) -> f64 {
        (self.page_width - 2.0 * self.margin).max(0.0)
    }

    fn bottom_limit(&self) -> f64 {
        self.page_height - self.margin
    }
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedLine {
    pub text: String,
    /// True when this line was produced by breaking the previous line at a space.
    pub continuation: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionedLine {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub continuation: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub lines: Vec<PositionedLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub setup: PageSetup,
    pub pages: Vec<Page>,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn lines(&self) -> impl Iterator<Item = &PositionedLine> {
        self.pages.iter().flat_map(|p| p.lines.iter())
    }

    /// Rebuilds the source text by undoing wrap breaks.
    pub fn source_text(&self) -> String {
        let mut out = String::new();
        for (idx, line) in self.lines().enumerate() {
            if idx > 0 {
                out.push(if line.continuation { ' ' } else { '\n' });
            }
            out.push_str(&line.text);
        }
        out
    }

    /// Whether `needle` appears on any single laid-out line.
    pub fn contains_line(&self, needle: &str) -> bool {
        self.lines().any(|l| l.text.contains(needle))
    }
}

/// Destination for a finished report.
pub trait DocumentSink {
    fn emit(&mut self, document: &ReportDocument, file_name: &str) -> Result<(), EmissionError>;
}

/// Greedy word wrap. Paragraphs are split on `\n`, words on single spaces;
/// a word wider than `max_width` is placed alone on its own line.
pub fn wrap_text(text: &str, max_width: f64, measure: &dyn TextMeasure) -> Vec<WrappedLine> {
    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph, max_width, measure, &mut out);
    }
    out
}

fn wrap_paragraph(
    paragraph: &str,
    max_width: f64,
    measure: &dyn TextMeasure,
    out: &mut Vec<WrappedLine>,
) {
    let mut words = paragraph.split(' ');
    let mut line = words.next().unwrap_or_default().to_string();
    let mut continuation = false;

    for word in words {
        let candidate = format!("{line} {word}");
        if measure.text_width(&candidate) <= max_width {
            line = candidate;
        } else {
            out.push(WrappedLine {
                text: std::mem::replace(&mut line, word.to_string()),
                continuation,
            });
            continuation = true;
        }
    }

    out.push(WrappedLine {
        text: line,
        continuation,
    });
}

/// Places lines top to bottom, starting a new page when the next baseline
/// would fall below `page_height - margin`.
pub fn paginate(lines: Vec<WrappedLine>, setup: &PageSetup) -> ReportDocument {
    let mut pages = vec![Page::default()];
    let mut row = 0usize;

    for line in lines {
        let mut y = setup.margin + row as f64 * setup.line_height;
        if y > setup.bottom_limit() && row > 0 {
            pages.push(Page::default());
            row = 0;
            y = setup.margin;
        }
        if let Some(page) = pages.last_mut() {
            page.lines.push(PositionedLine {
                text: line.text,
                x: setup.margin,
                y,
                continuation: line.continuation,
            });
        }
        row += 1;
    }

    ReportDocument {
        setup: *setup,
        pages,
    }
}

pub fn layout_text(text: &str, setup: &PageSetup, measure: &dyn TextMeasure) -> ReportDocument {
    let lines = wrap_text(text, setup.content_width(), measure);
    paginate(lines, setup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Monospace;

    #[test]
    fn break_consumes_exactly_one_space() {
        let measure = Monospace { advance: 1.0 };
        let lines = wrap_text("aaa bbb ccc", 7.0, &measure);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(vec!["aaa bbb", "ccc"], texts);
        assert!(!lines[0].continuation);
        assert!(lines[1].continuation);
    }

    #[test]
    fn overlong_word_sits_alone() {
        let measure = Monospace { advance: 1.0 };
        let lines = wrap_text("ab abcdefghij cd", 5.0, &measure);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(vec!["ab", "abcdefghij", "cd"], texts);
    }
}
