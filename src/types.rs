//! Core types used throughout the project.

/// A position in a translation file (0-indexed line, character counted in `char`s).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextPosition {
    pub line: u32,
    pub character: u32,
}

impl TextPosition {
    /// 1-based line number, the form lupdate and editors show to users.
    #[must_use]
    pub const fn display_line(self) -> u32 {
        self.line + 1
    }
}

/// Maps byte offsets of a text to line/character positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset at which each line starts.
    line_starts: Vec<usize>,
}

impl LineIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(offset, _)| offset + 1));
        Self { line_starts }
    }

    /// Converts a byte offset into a position.
    ///
    /// Offsets past the end of the text are clamped to the last line.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn position(&self, text: &str, offset: usize) -> TextPosition {
        let line = self.line_starts.partition_point(|&start| start <= offset).saturating_sub(1);
        let line_start = self.line_starts.get(line).copied().unwrap_or_default();
        let character = text
            .get(line_start..offset.min(text.len()))
            .map_or(0, |prefix| prefix.chars().count());

        TextPosition { line: line as u32, character: character as u32 }
    }
}
