//! Document and formatting model interfaces, plus a text-backed implementation.

use nova_core::{LineIndex, TextEdit, TextRange, TextSize};

use crate::{Block, FormatError};

/// Read access to the document text.
pub trait DocumentModel {
    fn text(&self) -> &str;

    fn text_in(&self, range: TextRange) -> Option<&str> {
        let start = u32::from(range.start()) as usize;
        let end = u32::from(range.end()) as usize;
        self.text().get(start..end)
    }

    fn line_number(&self, offset: TextSize) -> u32;

    fn line_start_offset(&self, line: u32) -> Option<TextSize>;

    fn text_len(&self) -> TextSize {
        TextSize::of(self.text())
    }
}

/// What the formatter needs from its host: the block tree, the document, and a way to write
/// whitespace back.
pub trait FormattingModel {
    fn root_block(&self) -> &dyn Block;

    fn document(&self) -> &dyn DocumentModel;

    /// Replace the whitespace at `range` (in current document coordinates) with `whitespace`.
    fn replace_whitespace(
        &mut self,
        range: TextRange,
        whitespace: &str,
    ) -> Result<(), FormatError>;

    /// Flush all replacements performed since the last commit.
    fn commit_changes(&mut self) {}
}

/// A string plus its [`LineIndex`].
#[derive(Clone, Debug)]
pub struct TextDocument {
    text: String,
    line_index: LineIndex,
}

impl TextDocument {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_index = LineIndex::new(&text);
        Self { text, line_index }
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl DocumentModel for TextDocument {
    fn text(&self) -> &str {
        &self.text
    }

    fn line_number(&self, offset: TextSize) -> u32 {
        self.line_index.line_number(offset)
    }

    fn line_start_offset(&self, line: u32) -> Option<TextSize> {
        self.line_index.line_start(line)
    }
}

/// A [`FormattingModel`] over an in-memory string.
///
/// Replacements are applied to the text immediately and recorded as [`TextEdit`]s against the
/// original text, so callers can either take the formatted text or forward minimal edits (for
/// example to an LSP client). The line index is refreshed on [`commit_changes`].
///
/// [`commit_changes`]: FormattingModel::commit_changes
#[derive(Debug)]
pub struct TextFormattingModel {
    document: TextDocument,
    root: Box<dyn Block>,
    edits: Vec<TextEdit>,
    shift: i64,
    pending_commit: bool,
}

impl TextFormattingModel {
    pub fn new(text: impl Into<String>, root: impl Block + 'static) -> Self {
        Self::from_boxed(text, Box::new(root))
    }

    pub fn from_boxed(text: impl Into<String>, root: Box<dyn Block>) -> Self {
        Self {
            document: TextDocument::new(text),
            root,
            edits: Vec::new(),
            shift: 0,
            pending_commit: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.document.text
    }

    /// Edits against the original text, in document order.
    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    pub fn into_text(self) -> String {
        self.document.into_text()
    }
}

impl FormattingModel for TextFormattingModel {
    fn root_block(&self) -> &dyn Block {
        self.root.as_ref()
    }

    fn document(&self) -> &dyn DocumentModel {
        &self.document
    }

    fn replace_whitespace(
        &mut self,
        range: TextRange,
        whitespace: &str,
    ) -> Result<(), FormatError> {
        let start = u32::from(range.start()) as usize;
        let end = u32::from(range.end()) as usize;
        let text_len = self.document.text.len();
        let current = self.document.text.get(start..end).ok_or_else(|| {
            FormatError::ModelInconsistency(format!(
                "whitespace range {range:?} is outside the document (length {text_len})"
            ))
        })?;
        if !current.chars().all(char::is_whitespace) {
            return Err(FormatError::ModelInconsistency(format!(
                "refusing to replace non-whitespace text {current:?} at {range:?}"
            )));
        }

        // Replacements arrive in document order, so subtracting the accumulated shift maps the
        // range back onto the original text.
        let original_start = (i64::from(u32::from(range.start())) - self.shift) as u32;
        let original_range = TextRange::at(TextSize::from(original_start), range.len());
        let edit = TextEdit::new(original_range, whitespace);
        self.shift += edit.len_delta();
        self.edits.push(edit);

        self.document.text.replace_range(start..end, whitespace);
        self.pending_commit = true;
        Ok(())
    }

    fn commit_changes(&mut self) {
        if std::mem::take(&mut self.pending_commit) {
            self.document.line_index = LineIndex::new(&self.document.text);
        }
    }
}
