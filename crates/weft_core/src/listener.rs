//! Listener identity
//!
//! Registrations on a shared reactive cell are keyed by an explicit
//! (subsystem, id) pair instead of a numeric-offset convention, so two
//! subsystems can never collide in one id space.

/// Which subsystem owns a listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListenerScope {
    General,
    LayoutAnimation,
}

/// Compound listener key. `Ord` is (scope, id), which also fixes the
/// notification order within one scope: ascending id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerKey {
    pub scope: ListenerScope,
    pub id: u64,
}

impl ListenerKey {
    pub fn general(id: u64) -> Self {
        Self { scope: ListenerScope::General, id }
    }

    /// Key for a layout-animation registration on a given view tag.
    pub fn layout(view_tag: i32) -> Self {
        Self {
            scope: ListenerScope::LayoutAnimation,
            id: view_tag as i64 as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_never_collide() {
        assert_ne!(ListenerKey::general(5), ListenerKey::layout(5));
    }

    #[test]
    fn ordering_is_scope_then_id() {
        assert!(ListenerKey::general(2) < ListenerKey::general(3));
        assert!(ListenerKey::general(u64::MAX) < ListenerKey::layout(0));
    }
}
