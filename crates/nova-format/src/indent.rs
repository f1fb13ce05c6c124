//! Indent rules and the resolved indentation of a whitespace gap.

use crate::settings::IndentOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndentKind {
    None,
    Normal,
    Continuation,
    /// Continuation indent for every block of a run except the first one.
    ContinuationWithoutFirst,
    /// `label_indent_size`, absolute when `label_indent_absolute` is set.
    Label,
    Spaces(u32),
}

/// How far a line is shifted when it begins with a given block, relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Indent {
    pub kind: IndentKind,
    /// Ignore the indentation of every ancestor.
    pub absolute: bool,
    /// Measure from the column where the direct parent starts, even if the parent does not
    /// start a line.
    pub relative_to_direct_parent: bool,
    /// Apply this indent to children even when this block does not start a line.
    pub enforce_indent_to_children: bool,
}

impl Indent {
    pub const fn new(kind: IndentKind) -> Self {
        Self {
            kind,
            absolute: false,
            relative_to_direct_parent: false,
            enforce_indent_to_children: false,
        }
    }

    pub const fn none() -> Self {
        Self::new(IndentKind::None)
    }

    pub const fn normal() -> Self {
        Self::new(IndentKind::Normal)
    }

    pub const fn continuation() -> Self {
        Self::new(IndentKind::Continuation)
    }

    pub const fn continuation_without_first() -> Self {
        Self::new(IndentKind::ContinuationWithoutFirst)
    }

    pub const fn label() -> Self {
        Self::new(IndentKind::Label)
    }

    pub const fn spaces(count: u32) -> Self {
        Self::new(IndentKind::Spaces(count))
    }

    pub const fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }

    pub const fn relative_to_direct_parent(mut self) -> Self {
        self.relative_to_direct_parent = true;
        self
    }

    pub const fn enforce_to_children(mut self) -> Self {
        self.enforce_indent_to_children = true;
        self
    }

    /// Width of this indent in columns. `first_of_run` only matters for
    /// [`IndentKind::ContinuationWithoutFirst`].
    pub fn columns(&self, options: &IndentOptions, first_of_run: bool) -> u32 {
        match self.kind {
            IndentKind::None => 0,
            IndentKind::Normal => options.indent_size,
            IndentKind::Continuation => options.continuation_indent_size,
            IndentKind::ContinuationWithoutFirst if first_of_run => 0,
            IndentKind::ContinuationWithoutFirst => options.continuation_indent_size,
            IndentKind::Label => options.label_indent_size,
            IndentKind::Spaces(count) => count,
        }
    }

    pub fn is_absolute(&self, options: &IndentOptions) -> bool {
        self.absolute || (self.kind == IndentKind::Label && options.label_indent_absolute)
    }
}

impl Default for Indent {
    fn default() -> Self {
        Self::none()
    }
}

/// The resolved shape of one whitespace gap: line feeds, then indentation, then spaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IndentInfo {
    pub line_feeds: u32,
    pub indent_spaces: u32,
    pub spaces: u32,
}

impl IndentInfo {
    pub const fn new(line_feeds: u32, indent_spaces: u32, spaces: u32) -> Self {
        Self {
            line_feeds,
            indent_spaces,
            spaces,
        }
    }

    /// Column of the token that follows this gap, if the gap starts a line.
    pub const fn column(&self) -> u32 {
        self.indent_spaces + self.spaces
    }

    /// Only the leading indentation (tabs/spaces per `options`), without line feeds.
    pub fn indent_string(&self, options: &IndentOptions) -> String {
        let mut out = String::with_capacity((self.indent_spaces + self.spaces) as usize);
        push_indent(&mut out, self.indent_spaces, options);
        out.extend(std::iter::repeat(' ').take(self.spaces as usize));
        out
    }

    /// Whitespace text for this gap.
    pub fn render(&self, options: &IndentOptions, line_separator: &str) -> String {
        let mut out = line_separator.repeat(self.line_feeds as usize);
        out.push_str(&self.indent_string(options));
        out
    }
}

fn push_indent(out: &mut String, columns: u32, options: &IndentOptions) {
    if options.use_tabs && options.tab_size > 0 {
        let tabs = columns / options.tab_size;
        out.extend(std::iter::repeat('\t').take(tabs as usize));
        out.extend(std::iter::repeat(' ').take((columns % options.tab_size) as usize));
    } else {
        out.extend(std::iter::repeat(' ').take(columns as usize));
    }
}
