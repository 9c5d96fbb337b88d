//! Minimal time units and strongly-typed durations/instants.
//!
//! The pump deals in two clock domains: engine deadlines (microsecond
//! resolution) and host timer delays (whole milliseconds). Keeping the unit
//! in the type makes the conversion point explicit and impossible to skip.

use core::fmt;
use core::marker::PhantomData;
use std::sync::OnceLock;

/// Marker trait for a time unit.
pub trait TimeUnit {
    /// Human-readable name for debugging.
    const NAME: &'static str;
    /// Number of units in one millisecond.
    const PER_MILLI: u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Micros {}
impl TimeUnit for Micros {
    const NAME: &'static str = "us";
    const PER_MILLI: u64 = 1000;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Millis {}
impl TimeUnit for Millis {
    const NAME: &'static str = "ms";
    const PER_MILLI: u64 = 1;
}

/// Strongly-typed duration in a given unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Duration<U: TimeUnit>(u64, PhantomData<U>);

/// Strongly-typed monotonic timestamp in a given unit.
///
/// Instants are measured from an arbitrary per-process epoch; only
/// differences between instants are meaningful.
#[repr(transparent)]
pub struct MonoInstant<U: TimeUnit>(u64, PhantomData<U>);

// Manual trait impls: the derived versions would add a phantom `U: Trait`
// bound (the only `U`-typed field is `PhantomData<U>`), which blocks use in
// generic contexts bounded only by `TimeUnit`. The instant is wholly
// described by its `u64`, so these impls ignore the unit marker.
impl<U: TimeUnit> Clone for MonoInstant<U> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}
impl<U: TimeUnit> Copy for MonoInstant<U> {}
impl<U: TimeUnit> fmt::Debug for MonoInstant<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MonoInstant").field(&self.0).finish()
    }
}
impl<U: TimeUnit> PartialEq for MonoInstant<U> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl<U: TimeUnit> Eq for MonoInstant<U> {}
impl<U: TimeUnit> PartialOrd for MonoInstant<U> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<U: TimeUnit> Ord for MonoInstant<U> {
    #[inline]
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}
impl<U: TimeUnit> core::hash::Hash for MonoInstant<U> {
    #[inline]
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<U: TimeUnit> Duration<U> {
    /// Creates a new duration.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value, PhantomData)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Zero-length duration.
    pub const ZERO: Self = Self::new(0);
}

impl Duration<Millis> {
    /// Convenience constructor for milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(value: u64) -> Self {
        Self::new(value)
    }

    /// Converts to a [`std::time::Duration`] for host APIs.
    #[inline]
    #[must_use]
    pub const fn to_std(self) -> std::time::Duration {
        std::time::Duration::from_millis(self.0)
    }
}

impl<U: TimeUnit> MonoInstant<U> {
    /// Creates a new instant from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value, PhantomData)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Duration elapsed since `earlier`, or zero if `earlier` is in the future.
    #[inline]
    #[must_use]
    pub fn saturating_since(self, earlier: Self) -> Duration<U> {
        Duration::new(self.0.saturating_sub(earlier.0))
    }
}

impl<U: TimeUnit> core::ops::Add<Duration<U>> for MonoInstant<U> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Duration<U>) -> Self::Output {
        MonoInstant::new(self.0 + rhs.0)
    }
}

impl<U: TimeUnit> core::ops::Sub<Duration<U>> for MonoInstant<U> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Duration<U>) -> Self::Output {
        MonoInstant::new(self.0 - rhs.0)
    }
}

impl<U: TimeUnit> core::ops::Sub for MonoInstant<U> {
    type Output = Duration<U>;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Duration::new(self.0 - rhs.0)
    }
}

/// A unit with an ambient monotonic clock.
pub trait Now: TimeUnit + Sized {
    /// Returns the current instant in this unit.
    fn now() -> MonoInstant<Self>;
}

static EPOCH: OnceLock<minstant::Instant> = OnceLock::new();

impl Now for Micros {
    fn now() -> MonoInstant<Self> {
        let epoch = EPOCH.get_or_init(minstant::Instant::now);
        MonoInstant::new(epoch.elapsed().as_micros() as u64)
    }
}
