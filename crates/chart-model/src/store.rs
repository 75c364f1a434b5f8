use std::collections::BTreeSet;

use crate::tick::{Tick, TickMap, TickSpan};

/// Index of the previous entry given a binary search result over sorted keys.
///
/// `inclusive` accepts an exact match; otherwise the entry strictly before
/// `tick` is returned. `None` means "before the first key".
pub(crate) fn previous_index(found: Result<usize, usize>, inclusive: bool) -> Option<usize> {
    match found {
        Ok(index) if inclusive => Some(index),
        Ok(index) | Err(index) => index.checked_sub(1),
    }
}

/// Index of the next entry given a binary search result over `len` sorted keys.
/// `None` means "after the last key".
pub(crate) fn next_index(found: Result<usize, usize>, len: usize, inclusive: bool) -> Option<usize> {
    let index = match found {
        Ok(index) if inclusive => index,
        Ok(index) => index + 1,
        Err(index) => index,
    };
    (index < len).then_some(index)
}

/// Previous key in a sorted, deduplicated tick slice.
pub fn previous_in(keys: &[Tick], tick: Tick, inclusive: bool) -> Option<Tick> {
    previous_index(keys.binary_search(&tick), inclusive).map(|i| keys[i])
}

/// Next key in a sorted, deduplicated tick slice.
pub fn next_in(keys: &[Tick], tick: Tick, inclusive: bool) -> Option<Tick> {
    next_index(keys.binary_search(&tick), keys.len(), inclusive).map(|i| keys[i])
}

/// Ordered, tick-keyed events of one payload type on one lane.
///
/// Keys are unique and never negative. Ticks marked as protected can be
/// overwritten but never removed.
#[derive(Debug, Clone)]
pub struct TickEventStore<T> {
    /// Sorted by tick ascending
    entries: Vec<(Tick, T)>,
    protected: BTreeSet<Tick>,
}

impl<T> Default for TickEventStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TickEventStore<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            protected: BTreeSet::new(),
        }
    }

    /// Store whose `ticks` can never be removed.
    pub fn with_protected<I>(ticks: I) -> Self
    where
        I: IntoIterator<Item = Tick>,
    {
        Self {
            entries: Vec::new(),
            protected: ticks.into_iter().collect(),
        }
    }

    pub fn protect(&mut self, tick: Tick) {
        self.protected.insert(tick);
    }

    pub fn is_protected(&self, tick: Tick) -> bool {
        self.protected.contains(&tick)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn search(&self, tick: Tick) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&tick, |(t, _)| *t)
    }

    /// Index window `[lo, hi)` of entries with `start <= tick <= end`.
    fn window(&self, start: Tick, end: Tick) -> (usize, usize) {
        if start > end {
            return (0, 0);
        }
        let lo = self.entries.partition_point(|(t, _)| *t < start);
        let hi = self.entries.partition_point(|(t, _)| *t <= end);
        (lo, hi.max(lo))
    }

    pub fn contains(&self, tick: Tick) -> bool {
        self.search(tick).is_ok()
    }

    pub fn get(&self, tick: Tick) -> Option<&T> {
        self.search(tick).ok().map(|i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, tick: Tick) -> Option<&mut T> {
        match self.search(tick) {
            Ok(i) => Some(&mut self.entries[i].1),
            Err(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tick, &T)> + '_ {
        self.entries.iter().map(|(t, v)| (*t, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Tick, &mut T)> + '_ {
        self.entries.iter_mut().map(|(t, v)| (*t, v))
    }

    pub fn ticks(&self) -> impl Iterator<Item = Tick> + '_ {
        self.entries.iter().map(|(t, _)| *t)
    }

    pub fn first_tick(&self) -> Option<Tick> {
        self.entries.first().map(|(t, _)| *t)
    }

    pub fn last_tick(&self) -> Option<Tick> {
        self.entries.last().map(|(t, _)| *t)
    }

    /// Events with `start <= tick <= end`, ascending.
    pub fn range(&self, start: Tick, end: Tick) -> impl Iterator<Item = (Tick, &T)> + '_ {
        let (lo, hi) = self.window(start, end);
        self.entries[lo..hi].iter().map(|(t, v)| (*t, v))
    }

    /// Insert or overwrite the event at `tick`. Negative ticks are rejected.
    pub fn add(&mut self, tick: Tick, value: T) -> Option<TickSpan> {
        if tick < 0 {
            log::debug!("Rejecting event at negative tick {tick}");
            return None;
        }
        match self.search(tick) {
            Ok(i) => self.entries[i].1 = value,
            Err(i) => self.entries.insert(i, (tick, value)),
        }
        Some(TickSpan::at(tick))
    }

    /// Remove and return the event at `tick`, unless the tick is protected.
    pub fn take(&mut self, tick: Tick) -> Option<T> {
        if self.is_protected(tick) {
            log::debug!("Refusing to remove protected tick {tick}");
            return None;
        }
        match self.search(tick) {
            Ok(i) => Some(self.entries.remove(i).1),
            Err(_) => None,
        }
    }

    /// Remove the event at `tick`. Returns false for protected or empty ticks.
    pub fn remove(&mut self, tick: Tick) -> bool {
        self.take(tick).is_some()
    }

    /// Last entry satisfying `pred`, where `pred` holds for a prefix of the entries
    /// (binary search over a monotone predicate).
    pub fn last_matching<P>(&self, mut pred: P) -> Option<(Tick, &T)>
    where
        P: FnMut(Tick, &T) -> bool,
    {
        let index = self.entries.partition_point(|(t, v)| pred(*t, v));
        index
            .checked_sub(1)
            .map(|i| (self.entries[i].0, &self.entries[i].1))
    }

    /// Closest key before `tick` (or at it, when `inclusive`).
    pub fn previous(&self, tick: Tick, inclusive: bool) -> Option<Tick> {
        previous_index(self.search(tick), inclusive).map(|i| self.entries[i].0)
    }

    /// Closest key after `tick` (or at it, when `inclusive`).
    pub fn next(&self, tick: Tick, inclusive: bool) -> Option<Tick> {
        next_index(self.search(tick), self.entries.len(), inclusive).map(|i| self.entries[i].0)
    }

    /// Remove every non-protected event with `start <= tick <= end`.
    ///
    /// The span of the removed data is `TickSpan::of_keys(removed.keys().copied())`.
    pub fn pop_range(&mut self, start: Tick, end: Tick) -> TickMap<T> {
        let (lo, hi) = self.window(start, end);
        let mut removed = TickMap::new();
        if lo == hi {
            return removed;
        }
        let mut kept = Vec::new();
        for (tick, value) in self.entries.drain(lo..hi) {
            if self.protected.contains(&tick) {
                kept.push((tick, value));
            } else {
                removed.insert(tick, value);
            }
        }
        self.entries.splice(lo..lo, kept);
        removed
    }

    /// Replace the whole content with `data`. Used to restore snapshots.
    pub fn replace_all(&mut self, data: TickMap<T>) {
        self.entries = data.into_iter().filter(|(t, _)| *t >= 0).collect();
    }
}

impl<T: Clone> TickEventStore<T> {
    /// Write every `(t, v)` of `data` at `t + offset`, replacing what was there.
    pub fn overwrite_with_offset(&mut self, data: &TickMap<T>, offset: Tick) -> Option<TickSpan> {
        data.iter().fold(None, |span, (tick, value)| match tick.checked_add(offset) {
            Some(target) => TickSpan::merge_opt(span, self.add(target, value.clone())),
            None => {
                log::debug!("Dropping event at {tick}: offset {offset} overflows");
                span
            }
        })
    }

    /// Copy of the events with `start <= tick <= end`.
    pub fn export_range(&self, start: Tick, end: Tick) -> TickMap<T> {
        self.range(start, end).map(|(t, v)| (t, v.clone())).collect()
    }

    pub fn export_all(&self) -> TickMap<T> {
        self.iter().map(|(t, v)| (t, v.clone())).collect()
    }
}
