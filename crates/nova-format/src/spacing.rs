//! Spacing rules: how many spaces and line feeds may separate two adjacent blocks.

use nova_core::TextRange;

/// Bounds for a single whitespace gap.
///
/// When `min_spaces > max_spaces` the minimum wins; contradictory rules are clamped rather than
/// rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpacingRule {
    pub min_spaces: u32,
    pub max_spaces: u32,
    pub min_line_feeds: u32,
    /// Line feeds to use once a break is emitted at all (for example to keep a blank line
    /// between two members when the original already had a break).
    pub preferred_line_feeds: u32,
    /// Whether line breaks present in the original text may survive.
    pub keep_line_breaks: bool,
    /// Maximum number of blank lines to keep. `None` defers to
    /// [`CodeStyleSettings::keep_blank_lines_in_code`](crate::CodeStyleSettings).
    pub keep_blank_lines: Option<u32>,
    /// The gap is emitted exactly as in the original text.
    pub read_only: bool,
    /// A non-empty gap is never collapsed to nothing, so adjacent tokens cannot fuse.
    pub safe: bool,
    /// A token that starts in column 0 stays in column 0.
    pub keep_first_column: bool,
}

impl SpacingRule {
    pub const fn new(
        min_spaces: u32,
        max_spaces: u32,
        min_line_feeds: u32,
        keep_line_breaks: bool,
        keep_blank_lines: Option<u32>,
    ) -> Self {
        Self {
            min_spaces,
            max_spaces,
            min_line_feeds,
            preferred_line_feeds: 0,
            keep_line_breaks,
            keep_blank_lines,
            read_only: false,
            safe: false,
            keep_first_column: false,
        }
    }

    pub const fn with_preferred_line_feeds(mut self, line_feeds: u32) -> Self {
        self.preferred_line_feeds = line_feeds;
        self
    }

    pub const fn with_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub const fn with_safe(mut self) -> Self {
        self.safe = true;
        self
    }

    pub const fn with_keep_first_column(mut self) -> Self {
        self.keep_first_column = true;
        self
    }

    /// `value` clamped into `[min_spaces, max_spaces]`, with `min_spaces` winning on conflict.
    pub fn clamp_spaces(&self, value: u32) -> u32 {
        value.min(self.max_spaces).max(self.min_spaces)
    }
}

/// A [`SpacingRule`] whose line-feed requirement depends on another range of the document.
///
/// If the resolved text of `dependency` spans several lines, at least one line feed is
/// required; otherwise the rule's own `min_line_feeds` applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DependentSpacing {
    pub rule: SpacingRule,
    pub dependency: TextRange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Spacing {
    Simple(SpacingRule),
    Dependent(DependentSpacing),
}

impl Spacing {
    pub const fn create(
        min_spaces: u32,
        max_spaces: u32,
        min_line_feeds: u32,
        keep_line_breaks: bool,
        keep_blank_lines: u32,
    ) -> Self {
        Spacing::Simple(SpacingRule::new(
            min_spaces,
            max_spaces,
            min_line_feeds,
            keep_line_breaks,
            Some(keep_blank_lines),
        ))
    }

    /// Exactly `count` spaces, never a line break.
    pub const fn spaces(count: u32) -> Self {
        Spacing::Simple(SpacingRule::new(count, count, 0, false, Some(0)))
    }

    /// Exactly one space, but an existing line break is kept.
    pub const fn space_or_break(keep_blank_lines: u32) -> Self {
        Spacing::Simple(SpacingRule::new(1, 1, 0, true, Some(keep_blank_lines)))
    }

    /// At least one line feed.
    pub const fn line_feed(keep_blank_lines: u32) -> Self {
        Spacing::Simple(SpacingRule::new(0, 0, 1, true, Some(keep_blank_lines)))
    }

    /// The gap is never touched.
    pub const fn read_only() -> Self {
        Spacing::Simple(SpacingRule::new(0, u32::MAX, 0, true, None).with_read_only())
    }

    pub const fn dependent(
        min_spaces: u32,
        max_spaces: u32,
        dependency: TextRange,
        keep_line_breaks: bool,
        keep_blank_lines: u32,
    ) -> Self {
        Spacing::Dependent(DependentSpacing {
            rule: SpacingRule::new(
                min_spaces,
                max_spaces,
                0,
                keep_line_breaks,
                Some(keep_blank_lines),
            ),
            dependency,
        })
    }

    pub const fn rule(&self) -> &SpacingRule {
        match self {
            Spacing::Simple(rule) => rule,
            Spacing::Dependent(dependent) => &dependent.rule,
        }
    }

    pub const fn dependency(&self) -> Option<TextRange> {
        match self {
            Spacing::Simple(_) => None,
            Spacing::Dependent(dependent) => Some(dependent.dependency),
        }
    }

    pub const fn is_read_only(&self) -> bool {
        self.rule().read_only
    }

    /// Effective minimum line feeds once it is known whether the dependency range renders on
    /// several lines. Simple spacings ignore the flag.
    pub fn min_line_feeds(&self, dependency_is_multiline: bool) -> u32 {
        match self {
            Spacing::Simple(rule) => rule.min_line_feeds,
            Spacing::Dependent(dependent) if dependency_is_multiline => {
                dependent.rule.min_line_feeds.max(1)
            }
            Spacing::Dependent(dependent) => dependent.rule.min_line_feeds,
        }
    }
}

impl From<SpacingRule> for Spacing {
    fn from(rule: SpacingRule) -> Self {
        Spacing::Simple(rule)
    }
}
