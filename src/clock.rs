//! Monotonic microsecond time source and wait deadlines.

/// A free-running microsecond counter.
///
/// The counter is allowed to wrap at `u32::MAX`; every comparison the driver
/// makes is done on elapsed time with wrapping arithmetic.
pub trait Clock {
    /// Current counter value in microseconds.
    fn now_us(&mut self) -> u32;
}

impl<F> Clock for F
where
    F: FnMut() -> u32,
{
    fn now_us(&mut self) -> u32 {
        self()
    }
}

/// Bounds a busy-wait loop: `budget` microseconds starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Deadline {
    start: u32,
    budget: u32,
}

impl Deadline {
    pub(crate) fn new(start: u32, budget: u32) -> Self {
        Deadline { start, budget }
    }

    #[inline]
    pub(crate) fn elapsed(&self, now: u32) -> u32 {
        now.wrapping_sub(self.start)
    }

    /// `true` once `now` is at or past `start + budget`.
    #[inline]
    pub(crate) fn reached(&self, now: u32) -> bool {
        self.elapsed(now) >= self.budget
    }
}
