use std::collections::BTreeMap;

use crate::error::ChartError;

/// Position on the chart timeline, in subdivisions of a quarter note.
///
/// Signed so that offset arithmetic (paste, move) can produce out-of-range
/// values that the stores then reject, rather than wrapping.
pub type Tick = i64;

/// Ordered tick-keyed snapshot, used for exports, clipboard data and move snapshots.
pub type TickMap<T> = BTreeMap<Tick, T>;

/// Ticks per quarter note, fixed for the lifetime of a loaded chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution(u32);

impl Resolution {
    /// Resolution used by most charts in the wild.
    pub const DEFAULT: Resolution = Resolution(192);

    pub fn new(ticks_per_quarter: u32) -> Result<Self, ChartError> {
        if ticks_per_quarter == 0 {
            return Err(ChartError::ZeroResolution);
        }
        Ok(Self(ticks_per_quarter))
    }

    pub fn ticks_per_quarter(self) -> u32 {
        self.0
    }

    /// Resolution as a float, for time conversion.
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }

    /// Rescale a tick from `other` resolution into this one (rounded to nearest).
    pub fn rescale_from(self, tick: Tick, other: Resolution) -> Tick {
        if self == other {
            return tick;
        }
        (tick as f64 * self.as_f64() / other.as_f64()).round() as Tick
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Inclusive tick range touched by a mutation.
///
/// Every mutating operation returns `Option<TickSpan>`; callers feed the span
/// into revalidation (HOPO sweep, sustain clamp, tempo recalculation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickSpan {
    pub start: Tick,
    pub end: Tick,
}

impl TickSpan {
    /// Span covering a single tick.
    pub fn at(tick: Tick) -> Self {
        Self {
            start: tick,
            end: tick,
        }
    }

    /// Span between two ticks, in either order.
    pub fn new(a: Tick, b: Tick) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn merge(self, other: TickSpan) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn merge_opt(a: Option<TickSpan>, b: Option<TickSpan>) -> Option<TickSpan> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, None) => a,
            (None, b) => b,
        }
    }

    /// Smallest span covering every tick yielded, or `None` for an empty iterator.
    pub fn of_keys<I>(ticks: I) -> Option<TickSpan>
    where
        I: IntoIterator<Item = Tick>,
    {
        ticks
            .into_iter()
            .fold(None, |acc, t| TickSpan::merge_opt(acc, Some(TickSpan::at(t))))
    }

    pub fn contains(&self, tick: Tick) -> bool {
        tick >= self.start && tick <= self.end
    }

    /// Number of ticks between the bounds (zero for a single-tick span).
    pub fn len(&self) -> Tick {
        self.end - self.start
    }

    pub fn shifted(self, offset: Tick) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_resolution_rejected() {
        assert!(matches!(Resolution::new(0), Err(ChartError::ZeroResolution)));
        assert_eq!(Resolution::new(480).unwrap().ticks_per_quarter(), 480);
    }

    #[test]
    fn rescale_between_resolutions() {
        let r192 = Resolution::new(192).unwrap();
        let r480 = Resolution::new(480).unwrap();
        assert_eq!(r480.rescale_from(192, r192), 480);
        assert_eq!(r192.rescale_from(480, r480), 192);
        assert_eq!(r192.rescale_from(100, r192), 100);
    }

    #[test]
    fn span_merge_and_keys() {
        let span = TickSpan::new(300, 100);
        assert_eq!(span, TickSpan { start: 100, end: 300 });
        assert_eq!(span.merge(TickSpan::at(500)).end, 500);
        assert_eq!(TickSpan::of_keys([40, 10, 25]), Some(TickSpan::new(10, 40)));
        assert_eq!(TickSpan::of_keys(std::iter::empty()), None);
        assert_eq!(TickSpan::merge_opt(None, Some(TickSpan::at(3))), Some(TickSpan::at(3)));
    }
}
