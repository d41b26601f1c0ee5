// crates/backendify-console/src/lifetime.rs
// ============================================================================
// Module: View Lifetime
// Description: Mount tokens for discarding results of unmounted views.
// Purpose: Drop fetch results that arrive after their view went away.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A view takes a [`ViewToken`] when it mounts and hands it to every fetch it
//! starts. Unmounting or remounting advances the lifetime, so values delivered
//! with an older token are dropped on arrival.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// Mount counter of one view.
#[derive(Debug, Default)]
pub struct ViewLifetime {
    /// Current mount generation; zero means never mounted.
    mount: AtomicU64,
    /// Whether the current generation is mounted.
    mounted: AtomicBool,
}

/// Token tying a fetch to one mount of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewToken {
    /// Mount generation the token belongs to.
    mount: u64,
}

impl ViewLifetime {
    /// Creates an unmounted lifetime.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts the view and returns the token for this mount.
    pub fn mount(&self) -> ViewToken {
        let mount = self.mount.fetch_add(1, Ordering::SeqCst) + 1;
        self.mounted.store(true, Ordering::SeqCst);
        ViewToken {
            mount,
        }
    }

    /// Unmounts the view; outstanding tokens go stale.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
        self.mount.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns true when `token` belongs to the current mount.
    #[must_use]
    pub fn is_current(&self, token: ViewToken) -> bool {
        self.mounted.load(Ordering::SeqCst) && self.mount.load(Ordering::SeqCst) == token.mount
    }

    /// Returns `value` when `token` is current, otherwise drops it.
    pub fn deliver<T>(&self, token: ViewToken, value: T) -> Option<T> {
        self.is_current(token).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_for_current_mount_are_delivered() {
        let view = ViewLifetime::new();
        let token = view.mount();
        assert_eq!(view.deliver(token, 5), Some(5));
    }

    #[test]
    fn results_after_unmount_are_dropped() {
        let view = ViewLifetime::new();
        let token = view.mount();
        view.unmount();
        assert_eq!(view.deliver(token, 5), None);
    }

    #[test]
    fn remount_invalidates_earlier_tokens() {
        let view = ViewLifetime::new();
        let first = view.mount();
        view.unmount();
        let second = view.mount();
        assert_eq!(view.deliver(first, "old"), None);
        assert_eq!(view.deliver(second, "new"), Some("new"));
    }
}
