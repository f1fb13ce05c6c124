//! The block model: the layout tree the formatter consumes.
//!
//! A [`Block`] covers a range of the document and either has sub-blocks (a composite) or none
//! (a leaf, i.e. exactly one token). Language integrations implement [`Block`] over their syntax
//! tree; [`SimpleBlock`] is a ready-made implementation for callers that build the tree
//! directly.

use std::fmt;

use nova_core::TextRange;

use crate::{Alignment, Indent, Spacing, Wrap};

/// Indent and alignment a new child would receive if inserted at a given index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChildAttributes {
    pub indent: Option<Indent>,
    pub alignment: Option<Alignment>,
}

impl ChildAttributes {
    pub fn new(indent: Option<Indent>, alignment: Option<Alignment>) -> Self {
        Self { indent, alignment }
    }
}

pub trait Block: fmt::Debug {
    fn text_range(&self) -> TextRange;

    /// Children in document order. Empty for leaves.
    fn sub_blocks(&self) -> &[Box<dyn Block>];

    /// Indent of this block relative to its parent.
    fn indent(&self) -> Option<Indent> {
        None
    }

    fn wrap(&self) -> Option<Wrap> {
        None
    }

    fn alignment(&self) -> Option<Alignment> {
        None
    }

    /// Spacing between the adjacent children `left` and `right` (indices into
    /// [`sub_blocks`](Block::sub_blocks)). `None` keeps the original gap, adjusting only the
    /// indentation of a line the right child starts.
    fn spacing(&self, left: usize, right: usize) -> Option<Spacing>;

    fn child_attributes(&self, _new_child_index: usize) -> ChildAttributes {
        ChildAttributes::default()
    }

    /// `false` once the syntax the block was built from has been invalidated.
    fn is_valid(&self) -> bool {
        true
    }

    fn is_leaf(&self) -> bool {
        self.sub_blocks().is_empty()
    }
}

/// A plain data [`Block`].
///
/// ```
/// use nova_core::{TextRange, TextSize};
/// use nova_format::{Block, Indent, SimpleBlock, Spacing};
///
/// let range = |start: u32, end: u32| TextRange::new(TextSize::from(start), TextSize::from(end));
/// let block = SimpleBlock::new(range(0, 9))
///     .with_spacing(Spacing::spaces(1))
///     .with_child(SimpleBlock::leaf(range(0, 5)))
///     .with_child(SimpleBlock::leaf(range(8, 9)).with_indent(Indent::normal()));
///
/// assert_eq!(block.sub_blocks().len(), 2);
/// assert_eq!(block.spacing(0, 1), Some(Spacing::spaces(1)));
/// ```
#[derive(Debug)]
pub struct SimpleBlock {
    range: TextRange,
    children: Vec<Box<dyn Block>>,
    indent: Option<Indent>,
    wrap: Option<Wrap>,
    alignment: Option<Alignment>,
    spacing: Option<Spacing>,
    spacing_overrides: Vec<(usize, Option<Spacing>)>,
    child_attributes: ChildAttributes,
    valid: bool,
}

impl SimpleBlock {
    pub fn new(range: TextRange) -> Self {
        Self {
            range,
            children: Vec::new(),
            indent: None,
            wrap: None,
            alignment: None,
            spacing: None,
            spacing_overrides: Vec::new(),
            child_attributes: ChildAttributes::default(),
            valid: true,
        }
    }

    pub fn leaf(range: TextRange) -> Self {
        Self::new(range)
    }

    pub fn with_child(mut self, child: impl Block + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }

    pub fn with_children<I, B>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Block + 'static,
    {
        self.children
            .extend(children.into_iter().map(|c| Box::new(c) as Box<dyn Block>));
        self
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = Some(indent);
        self
    }

    pub fn with_wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = Some(wrap);
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// Spacing used between every pair of adjacent children.
    pub fn with_spacing(mut self, spacing: Spacing) -> Self {
        self.spacing = Some(spacing);
        self
    }

    /// Spacing between child `index - 1` and child `index`, overriding [`with_spacing`].
    ///
    /// [`with_spacing`]: SimpleBlock::with_spacing
    pub fn with_spacing_before(mut self, index: usize, spacing: Option<Spacing>) -> Self {
        self.spacing_overrides.retain(|(i, _)| *i != index);
        self.spacing_overrides.push((index, spacing));
        self
    }

    pub fn with_child_attributes(mut self, attributes: ChildAttributes) -> Self {
        self.child_attributes = attributes;
        self
    }

    pub fn invalidated(mut self) -> Self {
        self.valid = false;
        self
    }
}

impl Block for SimpleBlock {
    fn text_range(&self) -> TextRange {
        self.range
    }

    fn sub_blocks(&self) -> &[Box<dyn Block>] {
        &self.children
    }

    fn indent(&self) -> Option<Indent> {
        self.indent
    }

    fn wrap(&self) -> Option<Wrap> {
        self.wrap.clone()
    }

    fn alignment(&self) -> Option<Alignment> {
        self.alignment.clone()
    }

    fn spacing(&self, _left: usize, right: usize) -> Option<Spacing> {
        self.spacing_overrides
            .iter()
            .find(|(index, _)| *index == right)
            .map_or(self.spacing, |(_, spacing)| *spacing)
    }

    fn child_attributes(&self, _new_child_index: usize) -> ChildAttributes {
        self.child_attributes.clone()
    }

    fn is_valid(&self) -> bool {
        self.valid
    }
}
