//! Wrap policies: whether a line break may (or must) be inserted before a block.

use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WrapKind {
    /// Never insert a break.
    None,
    /// Break at the last candidate of a line that exceeds the right margin.
    Normal,
    /// Break before every element.
    Always,
    /// Keep every element on one line if they fit, otherwise break before all of them.
    ChopDownIfLong,
}

/// A wrap shared by every block of one list (arguments, chained calls, ...).
///
/// Wraps are compared by identity: two `Wrap::new` calls produce distinct wraps even with equal
/// settings. Clones share identity.
#[derive(Clone)]
pub struct Wrap(Arc<WrapInner>);

struct WrapInner {
    kind: WrapKind,
    wrap_first_element: bool,
    parent: Option<Wrap>,
}

impl Wrap {
    pub fn new(kind: WrapKind, wrap_first_element: bool) -> Self {
        Self(Arc::new(WrapInner {
            kind,
            wrap_first_element,
            parent: None,
        }))
    }

    /// A wrap that only takes effect once `parent` has wrapped.
    pub fn child_of(parent: &Wrap, kind: WrapKind, wrap_first_element: bool) -> Self {
        Self(Arc::new(WrapInner {
            kind,
            wrap_first_element,
            parent: Some(parent.clone()),
        }))
    }

    pub fn kind(&self) -> WrapKind {
        self.0.kind
    }

    pub fn wrap_first_element(&self) -> bool {
        self.0.wrap_first_element
    }

    pub fn parent(&self) -> Option<&Wrap> {
        self.0.parent.as_ref()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Wrap {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Wrap {}

impl fmt::Debug for Wrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrap")
            .field("id", &format_args!("{:#x}", self.identity()))
            .field("kind", &self.0.kind)
            .field("wrap_first_element", &self.0.wrap_first_element)
            .field("has_parent", &self.0.parent.is_some())
            .finish()
    }
}
