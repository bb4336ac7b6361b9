//! Periodic sampling trigger
//!
//! The timing source runs in interrupt context and raises a one-shot "sample
//! ready" condition every N ticks. The dispatch loop consumes the condition
//! once per control step.
//!
//! ## Handshake
//! The condition is kept as two single-writer epochs:
//! - `raised` is written only by the timing source
//! - `consumed` is written only by the dispatch loop
//!
//! The condition is ready while the two differ. Any number of raises before
//! the next acknowledgement collapse into one pending sample (no backlog). A
//! raise that lands while a step is running is not erased by that step's
//! acknowledgement and is seen on the next poll.
//!
//! Only atomic loads and stores are used, so this also works on cores without
//! compare-and-swap.

use core::sync::atomic::{AtomicU16, AtomicU32, Ordering};

/// One-shot "sample ready" condition shared between interrupt and main context
pub struct SamplingFlag {
    raised: AtomicU32,
    consumed: AtomicU32,
}

/// Token for a pending sample, obtained from [`SamplingFlag::pending`]
///
/// Passing it back to [`SamplingFlag::acknowledge`] clears the condition.
#[must_use = "a pending sample must be acknowledged after the control step"]
#[derive(Debug, PartialEq, Eq)]
pub struct Pending {
    epoch: u32,
}

impl SamplingFlag {
    pub const fn new() -> Self {
        Self {
            raised: AtomicU32::new(0),
            consumed: AtomicU32::new(0),
        }
    }

    /// Set the condition (timing source side only)
    #[inline(always)]
    pub fn raise(&self) {
        let next = self.raised.load(Ordering::Relaxed).wrapping_add(1);
        self.raised.store(next, Ordering::Release);
    }

    /// Check the condition without consuming it
    #[inline(always)]
    pub fn is_ready(&self) -> bool {
        self.raised.load(Ordering::Acquire) != self.consumed.load(Ordering::Relaxed)
    }

    /// Take the pending sample, if any (dispatch side only)
    #[inline]
    pub fn pending(&self) -> Option<Pending> {
        let epoch = self.raised.load(Ordering::Acquire);
        if epoch != self.consumed.load(Ordering::Relaxed) {
            Some(Pending { epoch })
        } else {
            None
        }
    }

    /// Clear the condition after the control step has completed
    #[inline]
    pub fn acknowledge(&self, pending: Pending) {
        self.consumed.store(pending.epoch, Ordering::Release);
    }
}

impl Default for SamplingFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Tick counter that raises a [`SamplingFlag`] every `interval` ticks
///
/// `tick` must be called from a single context (normally the timer interrupt).
pub struct TimingSource<'a> {
    flag: &'a SamplingFlag,
    interval: u16,
    count: AtomicU16,
}

impl<'a> TimingSource<'a> {
    /// Create a timing source
    ///
    /// # Arguments
    /// * `flag` - Condition to raise
    /// * `interval` - Ticks per sample (0 is treated as 1)
    pub const fn new(flag: &'a SamplingFlag, interval: u16) -> Self {
        Self {
            flag,
            interval: if interval == 0 { 1 } else { interval },
            count: AtomicU16::new(0),
        }
    }

    /// Advance by one tick of the time base
    ///
    /// # Returns
    /// `true` if this tick completed an interval and raised the flag
    #[inline(always)]
    pub fn tick(&self) -> bool {
        let count = self.count.load(Ordering::Relaxed) + 1;
        if count >= self.interval {
            self.count.store(0, Ordering::Relaxed);
            self.flag.raise();
            true
        } else {
            self.count.store(count, Ordering::Relaxed);
            false
        }
    }

    /// Restart the current interval
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }

    /// Ticks per sample
    pub fn interval(&self) -> u16 {
        self.interval
    }

    pub fn flag(&self) -> &'a SamplingFlag {
        self.flag
    }
}
