//! Which parts of a document a formatting run may change.
//!
//! Every use case (format a selection, compute an indent, adjust indentation after a move) is a
//! predicate from a [`WhiteSpace`] to the [`ReadOnlyLevel`] it gets before the processor runs.

use nova_core::{TextRange, TextSize};

use crate::chain::LeafChain;
use crate::whitespace::{ReadOnlyLevel, WhiteSpace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatTextRange {
    range: TextRange,
    process_heading_whitespace: bool,
}

impl FormatTextRange {
    pub fn new(range: TextRange, process_heading_whitespace: bool) -> Self {
        Self {
            range,
            process_heading_whitespace,
        }
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    /// Whether the whitespace directly before the range may have its indentation fixed.
    pub fn process_heading_whitespace(&self) -> bool {
        self.process_heading_whitespace
    }

    fn classify(&self, whitespace: TextRange) -> ReadOnlyLevel {
        let range = self.range;
        if range.contains_range(whitespace) {
            ReadOnlyLevel::Writable
        } else if whitespace.start() < range.end() && range.start() < whitespace.end() {
            ReadOnlyLevel::LineFeeds
        } else if self.process_heading_whitespace && whitespace.end() == range.start() {
            ReadOnlyLevel::LineFeeds
        } else {
            ReadOnlyLevel::Full
        }
    }
}

/// The ranges a caller wants reformatted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatTextRanges {
    ranges: Vec<FormatTextRange>,
}

impl FormatTextRanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(range: TextRange) -> Self {
        let mut ranges = Self::new();
        ranges.push(range, false);
        ranges
    }

    pub fn push(&mut self, range: TextRange, process_heading_whitespace: bool) {
        self.ranges
            .push(FormatTextRange::new(range, process_heading_whitespace));
    }

    pub fn with(mut self, range: TextRange, process_heading_whitespace: bool) -> Self {
        self.push(range, process_heading_whitespace);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormatTextRange> {
        self.ranges.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The least restrictive level any range grants `whitespace`.
    pub fn classify(&self, whitespace: TextRange) -> ReadOnlyLevel {
        self.ranges
            .iter()
            .map(|range| range.classify(whitespace))
            .min()
            .unwrap_or(ReadOnlyLevel::Full)
    }

    /// Union of all ranges, if any.
    pub fn bounds(&self) -> Option<TextRange> {
        self.ranges
            .iter()
            .map(FormatTextRange::range)
            .reduce(|acc, range| acc.cover(range))
    }
}

impl FromIterator<TextRange> for FormatTextRanges {
    fn from_iter<I: IntoIterator<Item = TextRange>>(iter: I) -> Self {
        let mut ranges = Self::new();
        for range in iter {
            ranges.push(range, false);
        }
        ranges
    }
}

/// Set every whitespace's read-only level from `policy`.
pub fn apply_policy<F>(chain: &mut LeafChain, mut policy: F)
where
    F: FnMut(usize, &WhiteSpace) -> ReadOnlyLevel,
{
    for (index, ws) in chain.whitespaces_mut().iter_mut().enumerate() {
        let level = policy(index, ws);
        ws.set_read_only(level);
    }
}

/// Whitespace outside `ranges` becomes read-only; straddling whitespace keeps its line feeds.
pub fn mark_outside_ranges(chain: &mut LeafChain, ranges: &FormatTextRanges) {
    apply_policy(chain, |_, ws| ranges.classify(ws.range()));
}

/// Only the indentation of lines starting inside `range` may change.
pub fn mark_for_indent_adjustment(chain: &mut LeafChain, range: TextRange) {
    apply_policy(chain, |_, ws| {
        let line_start_in_range =
            ws.contains_line_feeds() && range.contains_inclusive(ws.range().end());
        if line_start_in_range {
            ReadOnlyLevel::LineFeeds
        } else {
            ReadOnlyLevel::Full
        }
    });
}

/// Everything is read-only except the line feeds of whitespace `target`.
pub fn mark_for_whitespace(chain: &mut LeafChain, target: usize) {
    apply_policy(chain, |index, _| {
        if index == target {
            ReadOnlyLevel::LineFeeds
        } else {
            ReadOnlyLevel::Full
        }
    });
}

/// [`mark_for_whitespace`] for the whitespace covering `offset`. Returns its index.
pub fn mark_for_offset(chain: &mut LeafChain, offset: TextSize) -> Option<usize> {
    let target = chain.whitespace_at(offset)?;
    mark_for_whitespace(chain, target);
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainBuilder;
    use crate::model::TextDocument;
    use crate::SimpleBlock;
    use pretty_assertions::assert_eq;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(TextSize::from(start), TextSize::from(end))
    }

    #[test]
    fn classifies_inside_straddling_and_outside() {
        let ranges = FormatTextRanges::single(range(10, 20));
        assert_eq!(ranges.classify(range(12, 14)), ReadOnlyLevel::Writable);
        assert_eq!(ranges.classify(range(8, 12)), ReadOnlyLevel::LineFeeds);
        assert_eq!(ranges.classify(range(18, 22)), ReadOnlyLevel::LineFeeds);
        assert_eq!(ranges.classify(range(2, 10)), ReadOnlyLevel::Full);
        assert_eq!(ranges.classify(range(21, 23)), ReadOnlyLevel::Full);
    }

    #[test]
    fn heading_whitespace_is_line_feeds_read_only_on_request() {
        let ranges = FormatTextRanges::new().with(range(10, 20), true);
        assert_eq!(ranges.classify(range(2, 10)), ReadOnlyLevel::LineFeeds);
    }

    #[test]
    fn most_permissive_range_wins() {
        let ranges: FormatTextRanges = [range(0, 5), range(4, 12)].into_iter().collect();
        assert_eq!(ranges.classify(range(3, 7)), ReadOnlyLevel::LineFeeds);
        assert_eq!(ranges.classify(range(6, 8)), ReadOnlyLevel::Writable);
        assert_eq!(ranges.bounds(), Some(range(0, 12)));
        assert_eq!(FormatTextRanges::new().classify(range(0, 1)), ReadOnlyLevel::Full);
    }

    #[test]
    fn offset_policy_opens_only_the_gap_at_the_offset() {
        let document = TextDocument::new("ab  cd");
        let root = SimpleBlock::new(range(0, 6))
            .with_child(SimpleBlock::leaf(range(0, 2)))
            .with_child(SimpleBlock::leaf(range(4, 6)));
        let mut chain = ChainBuilder::new(&document).build(&root).unwrap();

        assert_eq!(mark_for_offset(&mut chain, TextSize::from(3)), Some(1));
        let levels: Vec<ReadOnlyLevel> =
            chain.whitespaces().iter().map(WhiteSpace::read_only).collect();
        assert_eq!(
            levels,
            vec![
                ReadOnlyLevel::Full,
                ReadOnlyLevel::LineFeeds,
                ReadOnlyLevel::Full
            ]
        );

        // Inside a token there is no gap to open.
        assert_eq!(mark_for_offset(&mut chain, TextSize::from(1)), None);
    }
}
