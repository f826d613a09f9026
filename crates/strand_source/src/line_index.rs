//! Byte-offset to line/column mapping for diagnostic rendering.

use serde::{Deserialize, Serialize};

/// Precomputed line-start table for one source text.
///
/// Built once per file, then queried by the diagnostic renderer to turn a
/// span offset into a 1-based `(line, column)` pair and to fetch the text
/// of the offending line for caret underlining.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineIndex {
    /// Byte offset of the first character of each line.
    line_starts: Vec<u32>,
    /// Total length of the indexed text in bytes.
    len: u32,
}

impl LineIndex {
    /// Builds a line index for the given text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self {
            line_starts,
            len: text.len() as u32,
        }
    }

    /// Returns the 1-based `(line, column)` of a byte offset.
    ///
    /// Offsets past the end of the text map to the last line.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset.min(self.len)) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let col = offset.saturating_sub(self.line_starts[line]) + 1;
        (line as u32 + 1, col)
    }

    /// Returns the text of the 1-based line `line` within `text`.
    ///
    /// `text` must be the string this index was built from.
    pub fn line_text<'a>(&self, text: &'a str, line: u32) -> &'a str {
        let idx = (line.saturating_sub(1)) as usize;
        if idx >= self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[idx] as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| s as usize)
            .unwrap_or(text.len());
        text[start..end].trim_end_matches(['\n', '\r'])
    }

    /// Returns the number of lines in the indexed text.
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let idx = LineIndex::new("nand a b");
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line_col(5), (1, 6));
        assert_eq!(idx.line_count(), 1);
    }

    #[test]
    fn multi_line() {
        let text = "module top\n  wire a\nend\n";
        let idx = LineIndex::new(text);
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line_col(11), (2, 1));
        assert_eq!(idx.line_col(13), (2, 3));
        assert_eq!(idx.line_text(text, 2), "  wire a");
    }

    #[test]
    fn offset_past_end_clamps() {
        let text = "a\nb";
        let idx = LineIndex::new(text);
        let (line, _) = idx.line_col(100);
        assert_eq!(line, 2);
    }

    #[test]
    fn crlf_lines_trimmed() {
        let text = "LDA #$4F\r\nRTS\r\n";
        let idx = LineIndex::new(text);
        assert_eq!(idx.line_text(text, 1), "LDA #$4F");
        assert_eq!(idx.line_text(text, 2), "RTS");
    }

    #[test]
    fn out_of_range_line_is_empty() {
        let text = "one";
        let idx = LineIndex::new(text);
        assert_eq!(idx.line_text(text, 9), "");
    }
}
