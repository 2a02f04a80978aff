//! Screen geometry, as seen by vertical caret movement
//!
//! The editor never lays anything out. Whatever renders the source answers
//! these two questions, and a token it cannot place is left out of the
//! ranking.

use crate::source::Source;
use quill_parser::{grapheme_len, Node};

/// Horizontal extent of a rendered token
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub right: f64,
    pub width: f64,
}

impl Rect {
    pub fn new(left: f64, width: f64) -> Self {
        Self {
            left,
            right: left + width,
            width,
        }
    }

    /// Horizontal distance from `x` to the nearer edge
    pub fn distance(&self, x: f64) -> f64 {
        (x - self.left).abs().min((x - self.right).abs())
    }
}

pub trait Geometry {
    /// Current on-screen x of the caret
    fn caret_x(&self) -> Option<f64>;

    /// Where a token is drawn, if it is drawn at all
    fn token_rect(&self, token: &Node) -> Option<Rect>;
}

/// Fixed-width layout straight from the text: every grapheme is one cell
/// wide and lines start at x = 0
pub struct Monospace<'a> {
    source: &'a Source,
    caret: usize,
    cell: f64,
}

impl<'a> Monospace<'a> {
    pub fn new(source: &'a Source, caret: usize) -> Self {
        Self {
            source,
            caret,
            cell: 1.0,
        }
    }

    fn column(&self, offset: usize) -> f64 {
        (offset - self.source.code().line_start(offset)) as f64 * self.cell
    }
}

impl Geometry for Monospace<'_> {
    fn caret_x(&self) -> Option<f64> {
        (self.caret <= self.source.code().len()).then(|| self.column(self.caret))
    }

    fn token_rect(&self, token: &Node) -> Option<Rect> {
        let start = self.source.token_text_index(token)?;
        // Multi-line text only occupies its first line here
        let first_line = token.text().split('\n').next().unwrap_or("");
        Some(Rect::new(self.column(start), grapheme_len(first_line) as f64 * self.cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monospace_rects() {
        let source = Source::new("main", "a: 1\nbb: 22");
        let geometry = Monospace::new(&source, 7);
        assert_eq!(geometry.caret_x(), Some(2.0));

        let value = &source.tokens()[5];
        assert_eq!(value.text(), "22");
        assert_eq!(geometry.token_rect(value), Some(Rect::new(4.0, 2.0)));
        assert_eq!(Rect::new(4.0, 2.0).distance(5.0), 1.0);
        assert_eq!(Monospace::new(&source, 99).caret_x(), None);
    }
}
