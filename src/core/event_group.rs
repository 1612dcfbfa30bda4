//! Event group: a small set of settable, clearable and waitable flags

use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Notify;

/// Set of event flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventBits(u32);

impl EventBits {
    pub const NONE: EventBits = EventBits(0);
    /// Station joined a network and acquired an address
    pub const NETWORK_JOINED: EventBits = EventBits(1 << 0);
    /// Provisioning handshake acknowledged to the companion app
    pub const HANDSHAKE_DONE: EventBits = EventBits(1 << 1);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: EventBits) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventBits {
    type Output = EventBits;

    fn bitor(self, rhs: EventBits) -> EventBits {
        EventBits(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for EventBits {
    type Output = EventBits;

    fn bitand(self, rhs: EventBits) -> EventBits {
        EventBits(self.0 & rhs.0)
    }
}

/// Flag set with atomic set/clear and wait-for-any with auto-clear
#[derive(Debug, Default)]
pub struct EventGroup {
    bits: AtomicU32,
    notify: Notify,
}

impl EventGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set flags and wake every waiter
    pub fn set(&self, bits: EventBits) {
        self.bits.fetch_or(bits.0, Ordering::AcqRel);
        self.notify.notify_waiters();
    }

    /// Clear flags
    pub fn clear(&self, bits: EventBits) {
        self.bits.fetch_and(!bits.0, Ordering::AcqRel);
    }

    /// Currently set flags
    pub fn get(&self) -> EventBits {
        EventBits(self.bits.load(Ordering::Acquire))
    }

    /// Wait until any flag of `mask` is set
    ///
    /// Returns the observed subset of `mask`. All flags of `mask` are cleared
    /// in the same atomic operation, so a flag is observed at most once per set.
    pub async fn wait_any(&self, mask: EventBits) -> EventBits {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before testing so a concurrent set() cannot be missed
            notified.as_mut().enable();

            if let Some(observed) = self.take(mask) {
                return observed;
            }

            notified.await;
        }
    }

    fn take(&self, mask: EventBits) -> Option<EventBits> {
        let previous = self.bits.fetch_and(!mask.0, Ordering::AcqRel);
        let observed = EventBits(previous) & mask;
        (!observed.is_empty()).then_some(observed)
    }
}
