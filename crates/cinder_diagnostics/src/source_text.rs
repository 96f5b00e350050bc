//! Template body text with a line-start index for line/column lookup.

/// A template body indexed by line for diagnostic rendering.
///
/// Line and column numbers are 1-indexed throughout.
pub struct SourceText<'a> {
    content: &'a str,
    /// Byte offsets of each line start (the first entry is always 0).
    line_starts: Vec<u32>,
}

impl<'a> SourceText<'a> {
    /// Indexes the given text.
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            line_starts: compute_line_starts(content),
        }
    }

    /// Converts a byte offset into 1-indexed (line, column) coordinates.
    pub fn line_col(&self, byte_offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line = (line_idx as u32) + 1;
        let col = byte_offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Returns the text of a 1-indexed line without its newline, if it exists.
    pub fn line(&self, line: u32) -> Option<&'a str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)? as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map_or(self.content.len(), |next| *next as usize);
        Some(self.content[start..end].trim_end_matches(['\n', '\r']))
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Computes the byte offsets of each line start in the given content.
fn compute_line_starts(content: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, byte) in content.bytes().enumerate() {
        if byte == b'\n' {
            starts.push((i + 1) as u32);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_starts_computation() {
        let s = SourceText::new("abc\ndef\nghi");
        assert_eq!(s.line_starts, vec![0, 4, 8]);
        assert_eq!(s.line_count(), 3);
    }

    #[test]
    fn line_col_resolution() {
        let s = SourceText::new("abc\ndef\nghi");
        assert_eq!(s.line_col(0), (1, 1));
        assert_eq!(s.line_col(4), (2, 1));
        assert_eq!(s.line_col(5), (2, 2));
        assert_eq!(s.line_col(8), (3, 1));
    }

    #[test]
    fn line_text() {
        let s = SourceText::new("abc\r\ndef\n");
        assert_eq!(s.line(1), Some("abc"));
        assert_eq!(s.line(2), Some("def"));
        assert_eq!(s.line(3), Some(""));
        assert_eq!(s.line(0), None);
        assert_eq!(s.line(4), None);
    }

    #[test]
    fn empty_text() {
        let s = SourceText::new("");
        assert_eq!(s.line_col(0), (1, 1));
        assert_eq!(s.line(1), Some(""));
    }
}
