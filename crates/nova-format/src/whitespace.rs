//! Whitespace gaps between adjacent leaf blocks.

use nova_core::TextRange;

use crate::Spacing;

/// How much of a gap the formatter may change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadOnlyLevel {
    #[default]
    Writable,
    /// Spaces and indentation may change, the number of line feeds may not.
    LineFeeds,
    /// The gap keeps its original text.
    Full,
}

/// The gap before one leaf (or after the last leaf), as found in the original text.
#[derive(Clone, Debug)]
pub struct WhiteSpace {
    range: TextRange,
    original: String,
    line_feeds: u32,
    read_only: ReadOnlyLevel,
    /// Set for gaps that can never be formatted (non-whitespace text, document tail).
    locked: bool,
    spacing: Option<Spacing>,
}

impl WhiteSpace {
    pub(crate) fn new(range: TextRange, original: &str, spacing: Option<Spacing>) -> Self {
        Self {
            range,
            original: original.to_string(),
            line_feeds: count_line_feeds(original),
            read_only: ReadOnlyLevel::Writable,
            locked: false,
            spacing,
        }
    }

    pub(crate) fn locked(mut self) -> Self {
        self.read_only = ReadOnlyLevel::Full;
        self.locked = true;
        self
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn original_text(&self) -> &str {
        &self.original
    }

    pub fn original_line_feeds(&self) -> u32 {
        self.line_feeds
    }

    pub fn contains_line_feeds(&self) -> bool {
        self.line_feeds > 0
    }

    /// The spacing of the nearest common parent of the two leaves this gap separates.
    pub fn spacing(&self) -> Option<&Spacing> {
        self.spacing.as_ref()
    }

    pub fn read_only(&self) -> ReadOnlyLevel {
        self.read_only
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only == ReadOnlyLevel::Full
    }

    pub fn are_line_feeds_read_only(&self) -> bool {
        self.read_only >= ReadOnlyLevel::LineFeeds
    }

    /// Set the read-only level. Locked gaps stay fully read-only.
    pub fn set_read_only(&mut self, level: ReadOnlyLevel) {
        if !self.locked {
            self.read_only = level;
        }
    }
}

/// Number of line breaks in `text`; `\r\n` counts once.
pub(crate) fn count_line_feeds(text: &str) -> u32 {
    let bytes = text.as_bytes();
    let mut count = 0;
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'\n' => count += 1,
            b'\r' if bytes.get(i + 1) != Some(&b'\n') => count += 1,
            _ => {}
        }
    }
    count
}

/// Visual column reached after rendering `text` starting at `column`.
pub(crate) fn advance_column(column: u32, text: &str, tab_size: u32) -> u32 {
    let tab_size = tab_size.max(1);
    text.chars().fold(column, |column, ch| match ch {
        '\n' | '\r' => 0,
        '\t' => column + tab_size - column % tab_size,
        _ => column + 1,
    })
}

/// Width of the first line of `text` when it starts at `column`.
pub(crate) fn first_line_end_column(column: u32, text: &str, tab_size: u32) -> u32 {
    let first_line = text.split(['\n', '\r']).next().unwrap_or_default();
    advance_column(column, first_line, tab_size)
}
