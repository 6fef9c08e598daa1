//! Absolute timestamps and time spans.
//!
//! `Instant` is a thin alias over `chrono::DateTime<Utc>` — matching how the
//! rest of this codebase's lineage (`daterange.rs`, `location.rs`) already
//! represents absolute time, rather than introducing a second time crate.

use chrono::{DateTime, Utc};

/// An absolute instant in time, UTC, millisecond precision on the wire.
pub type Instant = DateTime<Utc>;

/// A `{start, end}` pair of absolute instants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSpan {
    pub start: Option<Instant>,
    pub end: Option<Instant>,
}

impl TimeSpan {
    pub fn new(start: Option<Instant>, end: Option<Instant>) -> Self {
        TimeSpan { start, end }
    }

    /// Valid iff both ends are set.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Duration in seconds. `0.0` if the span is invalid.
    pub fn duration(&self) -> f64 {
        match (self.start, self.end) {
            (Some(s), Some(e)) => (e - s).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        }
    }
}
