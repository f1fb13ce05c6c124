//! The leaf chain: the block tree flattened into an arena of leaves and the gaps between them.
//!
//! Building the chain validates the block tree once, so the processor can walk it by index
//! without re-checking ranges. Every leaf `i` is preceded by whitespace `i`; the last whitespace
//! covers the document tail after the final leaf.

use std::collections::HashMap;

use nova_core::{TextRange, TextSize};

use crate::model::DocumentModel;
use crate::whitespace::WhiteSpace;
use crate::{Alignment, Block, FormatError, Indent, IndentKind, Spacing, Wrap, WrapKind};

/// A block of the tree, composite or leaf.
#[derive(Clone, Debug)]
pub struct BlockNode {
    pub range: TextRange,
    pub parent: Option<usize>,
    pub depth: u32,
    pub indent: Option<Indent>,
    /// First block carrying a `ContinuationWithoutFirst` indent among its siblings.
    pub first_of_indent_run: bool,
    pub first_leaf: usize,
    pub last_leaf: usize,
    pub(crate) wrap: Option<usize>,
    pub(crate) alignment: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct LeafBlock {
    pub range: TextRange,
    pub node: usize,
    pub(crate) text: String,
    /// Blocks whose first leaf is this leaf, innermost first. Never empty.
    pub(crate) starting_blocks: Vec<usize>,
    /// Wraps of the starting blocks, innermost first.
    pub(crate) wraps: Vec<usize>,
    pub(crate) alignment: Option<usize>,
}

impl LeafBlock {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The outermost block that starts at this leaf.
    pub fn outermost_starting_block(&self) -> usize {
        *self.starting_blocks.last().unwrap_or(&self.node)
    }

    pub(crate) fn is_multiline(&self) -> bool {
        self.text.contains(['\n', '\r'])
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct WrapData {
    pub kind: WrapKind,
    pub wrap_first_element: bool,
    pub parent: Option<usize>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct AlignmentData {
    pub allow_backward_shift: bool,
    pub parent: Option<usize>,
}

/// What a new child inserted at the probed offset would look like.
#[derive(Clone, Debug)]
pub struct IndentProbe {
    /// Gap the probed offset falls into.
    pub whitespace: usize,
    /// The composite that would own the new child.
    pub parent: usize,
    pub indent: Option<Indent>,
    pub(crate) alignment: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct LeafChain {
    pub(crate) nodes: Vec<BlockNode>,
    pub(crate) leaves: Vec<LeafBlock>,
    pub(crate) whitespaces: Vec<WhiteSpace>,
    pub(crate) wraps: Vec<WrapData>,
    pub(crate) alignments: Vec<AlignmentData>,
    pub(crate) probe: Option<IndentProbe>,
    line_separator: &'static str,
}

impl LeafChain {
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn leaf(&self, index: usize) -> &LeafBlock {
        &self.leaves[index]
    }

    pub fn leaves(&self) -> &[LeafBlock] {
        &self.leaves
    }

    pub fn node(&self, index: usize) -> &BlockNode {
        &self.nodes[index]
    }

    pub fn whitespaces(&self) -> &[WhiteSpace] {
        &self.whitespaces
    }

    pub fn whitespaces_mut(&mut self) -> &mut [WhiteSpace] {
        &mut self.whitespaces
    }

    /// The whitespace after the last leaf.
    pub fn trailing_whitespace(&self) -> usize {
        self.leaves.len()
    }

    pub fn probe(&self) -> Option<&IndentProbe> {
        self.probe.as_ref()
    }

    /// `"\r\n"` when the document uses it, `"\n"` otherwise.
    pub fn line_separator(&self) -> &'static str {
        self.line_separator
    }

    /// Index of the gap containing `offset`, ends included.
    pub fn whitespace_at(&self, offset: TextSize) -> Option<usize> {
        let after = self
            .whitespaces
            .partition_point(|ws| ws.range().start() <= offset);
        let index = after.checked_sub(1)?;
        // Zero-length leaves make neighbouring gaps touch; prefer the earlier gap.
        let index = (0..=index)
            .rev()
            .take_while(|&i| self.whitespaces[i].range().contains_inclusive(offset))
            .last()?;
        Some(index)
    }

    /// Index of the leaf whose text contains `offset`.
    pub fn leaf_at(&self, offset: TextSize) -> Option<usize> {
        let after = self
            .leaves
            .partition_point(|leaf| leaf.range.start() <= offset);
        let index = after.checked_sub(1)?;
        self.leaves[index].range.contains(offset).then_some(index)
    }
}

/// Flattens a block tree over a document into a [`LeafChain`].
pub struct ChainBuilder<'a> {
    document: &'a dyn DocumentModel,
    probe_offset: Option<TextSize>,
    nodes: Vec<BlockNode>,
    leaves: Vec<LeafBlock>,
    whitespaces: Vec<WhiteSpace>,
    wraps: Vec<WrapData>,
    alignments: Vec<AlignmentData>,
    wrap_ids: HashMap<usize, usize>,
    alignment_ids: HashMap<usize, usize>,
    probe: Option<IndentProbe>,
    last_leaf_end: TextSize,
}

impl<'a> ChainBuilder<'a> {
    pub fn new(document: &'a dyn DocumentModel) -> Self {
        Self {
            document,
            probe_offset: None,
            nodes: Vec::new(),
            leaves: Vec::new(),
            whitespaces: Vec::new(),
            wraps: Vec::new(),
            alignments: Vec::new(),
            wrap_ids: HashMap::new(),
            alignment_ids: HashMap::new(),
            probe: None,
            last_leaf_end: TextSize::from(0),
        }
    }

    /// Record the child attributes of the deepest composite with a gap between two children at
    /// `offset`, or of the root when `offset` lies after the last leaf.
    pub fn with_probe(mut self, offset: TextSize) -> Self {
        self.probe_offset = Some(offset);
        self
    }

    pub fn build(mut self, root: &dyn Block) -> Result<LeafChain, FormatError> {
        let text_len = self.document.text_len();
        let root_range = root.text_range();
        if root_range.end() > text_len {
            return Err(FormatError::ModelInconsistency(format!(
                "root block {root_range:?} extends past the end of the document ({text_len:?})"
            )));
        }

        let mut starting = Vec::new();
        self.visit(root, None, 0, &mut starting, None, false)?;

        // Past the last leaf, a new line belongs to the root.
        if self.probe.is_none() && self.probe_offset.is_some_and(|o| o >= self.last_leaf_end) {
            let attributes = root.child_attributes(root.sub_blocks().len());
            let alignment = attributes
                .alignment
                .map(|alignment| self.intern_alignment(&alignment));
            self.probe = Some(IndentProbe {
                whitespace: self.leaves.len(),
                parent: 0,
                indent: attributes.indent,
                alignment,
            });
        }

        let tail = TextRange::new(self.last_leaf_end, text_len);
        let tail_text = self.text_in(tail)?;
        self.whitespaces
            .push(WhiteSpace::new(tail, tail_text, None).locked());

        let text = self.document.text();
        let line_separator = match text.find('\n') {
            Some(pos) if pos > 0 && text.as_bytes()[pos - 1] == b'\r' => "\r\n",
            _ => "\n",
        };

        tracing::trace!(
            target = "nova.format",
            blocks = self.nodes.len(),
            leaves = self.leaves.len(),
            "built leaf chain"
        );

        Ok(LeafChain {
            nodes: self.nodes,
            leaves: self.leaves,
            whitespaces: self.whitespaces,
            wraps: self.wraps,
            alignments: self.alignments,
            probe: self.probe,
            line_separator,
        })
    }

    fn visit(
        &mut self,
        block: &dyn Block,
        parent: Option<usize>,
        depth: u32,
        starting: &mut Vec<usize>,
        spacing: Option<Spacing>,
        first_of_indent_run: bool,
    ) -> Result<(), FormatError> {
        let range = block.text_range();
        let wrap = block.wrap().map(|wrap| self.intern_wrap(&wrap));
        let alignment = block
            .alignment()
            .map(|alignment| self.intern_alignment(&alignment));
        let node = self.nodes.len();
        self.nodes.push(BlockNode {
            range,
            parent,
            depth,
            indent: block.indent(),
            first_of_indent_run,
            first_leaf: self.leaves.len(),
            last_leaf: self.leaves.len(),
            wrap,
            alignment,
        });
        starting.push(node);

        let children = block.sub_blocks();
        if children.is_empty() {
            self.push_leaf(node, range, starting, spacing)?;
        } else {
            let mut prev_end = range.start();
            let mut seen_run = false;
            for (index, child) in children.iter().enumerate() {
                let child_range = child.text_range();
                if !range.contains_range(child_range) {
                    return Err(FormatError::ModelInconsistency(format!(
                        "child block {child_range:?} is not inside its parent {range:?}"
                    )));
                }
                if index > 0 && child_range.start() < prev_end {
                    return Err(FormatError::ModelInconsistency(format!(
                        "child block {child_range:?} overlaps or precedes its previous sibling"
                    )));
                }
                if index > 0 {
                    self.check_probe(block, node, depth, index, prev_end, child_range.start());
                }

                let in_run = child
                    .indent()
                    .is_some_and(|indent| indent.kind == IndentKind::ContinuationWithoutFirst);
                let first_of_run = in_run && !seen_run;
                seen_run |= in_run;

                let child_spacing = if index == 0 {
                    spacing
                } else {
                    block.spacing(index - 1, index)
                };
                self.visit(
                    child.as_ref(),
                    Some(node),
                    depth + 1,
                    starting,
                    child_spacing,
                    first_of_run,
                )?;
                prev_end = child_range.end();
            }
        }

        self.nodes[node].last_leaf = self.leaves.len() - 1;
        Ok(())
    }

    fn push_leaf(
        &mut self,
        node: usize,
        range: TextRange,
        starting: &mut Vec<usize>,
        spacing: Option<Spacing>,
    ) -> Result<(), FormatError> {
        if range.start() < self.last_leaf_end {
            return Err(FormatError::ModelInconsistency(format!(
                "leaf block {range:?} overlaps the previous leaf"
            )));
        }
        let gap = TextRange::new(self.last_leaf_end, range.start());
        let gap_text = self.text_in(gap)?;
        let mut whitespace = WhiteSpace::new(gap, gap_text, spacing);
        if !gap_text.chars().all(char::is_whitespace) {
            tracing::warn!(
                target = "nova.format",
                range = ?gap,
                "text between blocks is not whitespace; leaving it untouched"
            );
            whitespace = whitespace.locked();
        }
        self.whitespaces.push(whitespace);

        let text = self.text_in(range)?.to_string();
        let starting_blocks: Vec<usize> = starting.drain(..).rev().collect();
        let mut wraps = Vec::new();
        for &block in &starting_blocks {
            if let Some(wrap) = self.nodes[block].wrap {
                if !wraps.contains(&wrap) {
                    wraps.push(wrap);
                }
            }
        }
        let alignment = starting_blocks
            .iter()
            .find_map(|&block| self.nodes[block].alignment);

        self.leaves.push(LeafBlock {
            range,
            node,
            text,
            starting_blocks,
            wraps,
            alignment,
        });
        self.last_leaf_end = range.end();
        Ok(())
    }

    fn check_probe(
        &mut self,
        block: &dyn Block,
        node: usize,
        depth: u32,
        child_index: usize,
        gap_start: TextSize,
        gap_end: TextSize,
    ) {
        let Some(offset) = self.probe_offset else {
            return;
        };
        if offset < gap_start || offset > gap_end {
            return;
        }
        if self
            .probe
            .as_ref()
            .is_some_and(|probe| self.nodes[probe.parent].depth >= depth)
        {
            return;
        }
        let attributes = block.child_attributes(child_index);
        let alignment = attributes
            .alignment
            .map(|alignment| self.intern_alignment(&alignment));
        self.probe = Some(IndentProbe {
            // The next leaf pushed is the first leaf of child `child_index`.
            whitespace: self.leaves.len(),
            parent: node,
            indent: attributes.indent,
            alignment,
        });
    }

    fn intern_wrap(&mut self, wrap: &Wrap) -> usize {
        if let Some(&id) = self.wrap_ids.get(&wrap.identity()) {
            return id;
        }
        let parent = wrap.parent().map(|parent| self.intern_wrap(parent));
        let id = self.wraps.len();
        self.wraps.push(WrapData {
            kind: wrap.kind(),
            wrap_first_element: wrap.wrap_first_element(),
            parent,
        });
        self.wrap_ids.insert(wrap.identity(), id);
        id
    }

    fn intern_alignment(&mut self, alignment: &Alignment) -> usize {
        if let Some(&id) = self.alignment_ids.get(&alignment.identity()) {
            return id;
        }
        let parent = alignment
            .parent()
            .map(|parent| self.intern_alignment(parent));
        let id = self.alignments.len();
        self.alignments.push(AlignmentData {
            allow_backward_shift: alignment.allow_backward_shift(),
            parent,
        });
        self.alignment_ids.insert(alignment.identity(), id);
        id
    }

    fn text_in(&self, range: TextRange) -> Result<&'a str, FormatError> {
        let document = self.document;
        document.text_in(range).ok_or_else(|| {
            FormatError::ModelInconsistency(format!(
                "block range {range:?} does not fall on character boundaries of the document"
            ))
        })
    }
}
