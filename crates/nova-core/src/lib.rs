//! Core text primitives shared by the Nova formatting crates.
//!
//! This crate is intentionally small: byte offsets and ranges (re-exported from `text-size`),
//! a [`LineIndex`] for offset/line conversions, and [`TextEdit`] helpers used to describe
//! whitespace replacements.

mod edit;
mod text;

pub use edit::{apply_text_edits, normalize_text_edits, EditError, TextEdit};
pub use text::{LineIndex, TextRange, TextSize};
