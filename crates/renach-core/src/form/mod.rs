//! RENACH form field extraction.

pub mod fixtures;
pub mod locator;
mod parser;
pub mod rules;

pub use parser::{FormParser, ParseResult, RenachParser, compose_address};

/// Full text of a form, as produced by the PDF text extractor.
#[derive(Debug, Clone, Copy)]
pub struct DocumentText<'a> {
    text: &'a str,
}

/// One line of the document with its byte offsets (newline excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

impl<'a> DocumentText<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Lines in reading order, with `\r` stripped.
    pub fn lines(&self) -> impl Iterator<Item = Line<'a>> + 'a {
        let text = self.text;
        let mut offset = 0;
        text.split('\n').map(move |raw| {
            let start = offset;
            offset += raw.len() + 1;
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            Line {
                start,
                end: start + line.len(),
                text: line,
            }
        })
    }

    /// Lines starting at or after `offset`.
    pub fn lines_from(&self, offset: usize) -> impl Iterator<Item = Line<'a>> + 'a {
        self.lines().filter(move |l| l.start >= offset)
    }

    /// The line containing `offset`.
    pub fn line_at(&self, offset: usize) -> Option<Line<'a>> {
        self.lines().find(|l| offset >= l.start && offset <= l.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_keep_offsets() {
        let doc = DocumentText::new("Nome:\r\nPai:\nMãe:");
        let lines: Vec<_> = doc.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "Nome:");
        assert_eq!(lines[1].start, 7);
        assert_eq!(&doc.as_str()[lines[2].start..lines[2].end], "Mãe:");
    }

    #[test]
    fn test_line_at() {
        let doc = DocumentText::new("abc\ndef");
        assert_eq!(doc.line_at(5).map(|l| l.text), Some("def"));
    }
}
