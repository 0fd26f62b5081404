use core::fmt;
use core::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::{CoreError, CoreResult};

static NEXT_CONFIG_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of one aggregation config.
///
/// Ids come from a single process-wide counter, so an id taken from one
/// visualization never matches a config owned by another. Two configs with
/// equal fields are still different configs; removal and lookup go through
/// this id, never through value equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigId(NonZeroU32);

impl ConfigId {
    /// Allocate an id not handed out before in this process.
    pub fn allocate() -> CoreResult<Self> {
        allocate_from(&NEXT_CONFIG_ID)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Take the counter's current value and advance it; fails once it would wrap.
fn allocate_from(counter: &AtomicU32) -> CoreResult<ConfigId> {
    counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
        .ok()
        .and_then(NonZeroU32::new)
        .map(ConfigId)
        .ok_or(CoreError::ConfigIdsExhausted)
}

impl fmt::Debug for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigId({})", self.0)
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocated_ids_are_distinct() {
        let a = ConfigId::allocate().unwrap();
        let b = ConfigId::allocate().unwrap();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn counter_exhaustion_is_an_error() {
        let counter = AtomicU32::new(u32::MAX - 1);
        let last = allocate_from(&counter).unwrap();
        assert_eq!(last.get(), u32::MAX - 1);
        assert_eq!(allocate_from(&counter), Err(CoreError::ConfigIdsExhausted));
        assert_eq!(allocate_from(&counter), Err(CoreError::ConfigIdsExhausted));
    }

    #[test]
    fn zero_counter_never_yields_an_id() {
        let counter = AtomicU32::new(0);
        assert_eq!(allocate_from(&counter), Err(CoreError::ConfigIdsExhausted));
        // the counter moved past zero, so the next call succeeds
        assert_eq!(allocate_from(&counter).unwrap().get(), 1);
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<ConfigId>(),
            core::mem::size_of::<Option<ConfigId>>()
        );
    }
}
