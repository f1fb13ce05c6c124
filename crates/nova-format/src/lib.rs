//! Nova's block-tree whitespace formatter.
//!
//! A language integration describes a document as a tree of [`Block`]s: every leaf is one
//! token, every composite says how its children are indented, spaced, wrapped and aligned. The
//! formatter flattens that tree into a chain of leaves separated by whitespace gaps
//! ([`chain`]), decides the final text of each gap ([`FormatProcessor`]) and writes the changed
//! gaps back through a [`FormattingModel`]. Tokens themselves are never modified.
//!
//! ```
//! use nova_core::{TextRange, TextSize};
//! use nova_format::{Formatter, SimpleBlock, Spacing, TextFormattingModel};
//!
//! let range = |start: u32, end: u32| TextRange::new(TextSize::from(start), TextSize::from(end));
//! let root = SimpleBlock::new(range(0, 9))
//!     .with_spacing(Spacing::spaces(1))
//!     .with_child(SimpleBlock::leaf(range(0, 5)))
//!     .with_child(SimpleBlock::leaf(range(8, 9)));
//!
//! let mut model = TextFormattingModel::new("if(x)\n\n\n{", root);
//! let outcome = Formatter::default().format_whole_model(&mut model).unwrap();
//! assert_eq!(model.text(), "if(x) {");
//! assert_eq!(outcome.changed_whitespaces, 1);
//! ```

mod alignment;
mod block;
pub mod chain;
mod formatter;
mod indent;
mod model;
mod processor;
pub mod ranges;
mod settings;
mod spacing;
mod whitespace;
mod wrap;

use nova_core::TextSize;
use thiserror::Error;

pub use alignment::Alignment;
pub use block::{Block, ChildAttributes, SimpleBlock};
pub use formatter::{FormatOutcome, Formatter, FormatterState, FormattingDisabled};
pub use indent::{Indent, IndentInfo, IndentKind};
pub use model::{DocumentModel, FormattingModel, TextDocument, TextFormattingModel};
pub use processor::{FormatProcessor, ProcessorState};
pub use ranges::{FormatTextRange, FormatTextRanges};
pub use settings::{CodeStyleSettings, IndentOptions, SettingsError, StyleOption};
pub use spacing::{DependentSpacing, Spacing, SpacingRule};
pub use whitespace::{ReadOnlyLevel, WhiteSpace};
pub use wrap::{Wrap, WrapKind};

#[derive(Debug, Error)]
pub enum FormatError {
    /// The block tree and the document disagree. Nothing was written.
    #[error("formatting model is inconsistent: {0}")]
    ModelInconsistency(String),
    #[error("offset {0:?} is not inside a whitespace gap of the document")]
    InvalidOffset(TextSize),
    #[error("line {0} does not exist")]
    InvalidLine(u32),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
