//! Alignment groups: blocks that must start in the same column.

use std::fmt;
use std::sync::Arc;

/// Identity token shared by every block of one alignment group.
///
/// By default a group may shift backwards: when a later member naturally sits further right
/// than the column chosen so far, earlier members are moved right as well, so the group ends up
/// at the largest column among its members. [`Alignment::anchored`] groups instead align every
/// later member to the first member's column.
#[derive(Clone)]
pub struct Alignment(Arc<AlignmentInner>);

struct AlignmentInner {
    allow_backward_shift: bool,
    parent: Option<Alignment>,
}

impl Alignment {
    pub fn new() -> Self {
        Self(Arc::new(AlignmentInner {
            allow_backward_shift: true,
            parent: None,
        }))
    }

    pub fn anchored() -> Self {
        Self(Arc::new(AlignmentInner {
            allow_backward_shift: false,
            parent: None,
        }))
    }

    /// A group that falls back to `parent`'s column until one of its own members is placed.
    pub fn child_of(parent: &Alignment) -> Self {
        Self(Arc::new(AlignmentInner {
            allow_backward_shift: parent.allow_backward_shift(),
            parent: Some(parent.clone()),
        }))
    }

    pub fn allow_backward_shift(&self) -> bool {
        self.0.allow_backward_shift
    }

    pub fn parent(&self) -> Option<&Alignment> {
        self.0.parent.as_ref()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Alignment {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Alignment {}

impl fmt::Debug for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alignment")
            .field("id", &format_args!("{:#x}", self.identity()))
            .field("allow_backward_shift", &self.0.allow_backward_shift)
            .field("has_parent", &self.0.parent.is_some())
            .finish()
    }
}
