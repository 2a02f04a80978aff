use unicode_segmentation::UnicodeSegmentation;

/// Source text addressed by grapheme index
///
/// Offsets everywhere in the editor count extended grapheme clusters, so a
/// caret can never land inside a multi-codepoint character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    text: String,
    /// Byte offset of each grapheme, followed by the text length
    boundaries: Vec<usize>,
}

impl Code {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut boundaries: Vec<usize> = text.grapheme_indices(true).map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self { text, boundaries }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of graphemes
    pub fn len(&self) -> usize {
        self.boundaries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The grapheme at `index`
    pub fn at(&self, index: usize) -> Option<&str> {
        self.slice(index, index + 1)
    }

    /// Graphemes in `start..end`
    pub fn slice(&self, start: usize, end: usize) -> Option<&str> {
        if start > end {
            return None;
        }
        let from = *self.boundaries.get(start)?;
        let to = *self.boundaries.get(end)?;
        Some(&self.text[from..to])
    }

    pub fn byte_offset(&self, index: usize) -> Option<usize> {
        self.boundaries.get(index).copied()
    }

    /// Index of the grapheme holding byte `offset`; the text length maps to
    /// `len()`
    pub fn grapheme_index(&self, offset: usize) -> usize {
        self.boundaries
            .partition_point(|&boundary| boundary <= offset)
            .saturating_sub(1)
    }

    pub fn with_graphemes_at(&self, text: &str, index: usize) -> Option<Code> {
        let at = self.byte_offset(index)?;
        let mut edited = String::with_capacity(self.text.len() + text.len());
        edited.push_str(&self.text[..at]);
        edited.push_str(text);
        edited.push_str(&self.text[at..]);
        Some(Code::new(edited))
    }

    /// Remove the graphemes in `start..end`
    pub fn without_graphemes_between(&self, start: usize, end: usize) -> Option<Code> {
        if start > end {
            return None;
        }
        let from = self.byte_offset(start)?;
        let to = self.byte_offset(end)?;
        let mut edited = String::with_capacity(self.text.len() - (to - from));
        edited.push_str(&self.text[..from]);
        edited.push_str(&self.text[to..]);
        Some(Code::new(edited))
    }

    /// Index of the first grapheme of the line holding `index`
    pub fn line_start(&self, index: usize) -> usize {
        let mut start = index.min(self.len());
        while start > 0 && self.at(start - 1) != Some("\n") {
            start -= 1;
        }
        start
    }

    pub fn lines(&self) -> Vec<&str> {
        self.text.split('\n').collect()
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphemes_not_bytes() {
        let code = Code::new("ƒ é\u{301}!");
        assert_eq!(code.len(), 4);
        assert_eq!(code.at(2), Some("é\u{301}"));
        assert_eq!(code.at(4), None);
    }

    #[test]
    fn test_grapheme_index_of_bytes() {
        // A combining mark after a space joins the space's grapheme
        let code = Code::new("a \u{301}");
        assert_eq!(code.len(), 2);
        assert_eq!(code.grapheme_index(0), 0);
        assert_eq!(code.grapheme_index(1), 1);
        assert_eq!(code.grapheme_index(2), 1);
        assert_eq!(code.grapheme_index(code.as_str().len()), 2);
    }

    #[test]
    fn test_edits() {
        let code = Code::new("a: 1");
        assert_eq!(code.with_graphemes_at("bc", 1).unwrap().as_str(), "abc: 1");
        assert_eq!(code.with_graphemes_at("!", 4).unwrap().as_str(), "a: 1!");
        assert!(code.with_graphemes_at("!", 5).is_none());
        assert_eq!(code.without_graphemes_between(1, 3).unwrap().as_str(), "a1");
        assert!(code.without_graphemes_between(3, 1).is_none());
    }

    #[test]
    fn test_line_start() {
        let code = Code::new("ab\ncd");
        assert_eq!(code.line_start(4), 3);
        assert_eq!(code.line_start(3), 3);
        assert_eq!(code.line_start(2), 0);
        assert_eq!(code.lines(), vec!["ab", "cd"]);
    }
}
