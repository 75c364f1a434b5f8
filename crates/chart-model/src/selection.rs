use std::collections::BTreeSet;

use crate::store::TickEventStore;
use crate::tick::{Tick, TickMap};

/// Ticks currently selected on one lane.
///
/// Entries may outlive the events they point at (the event was deleted or
/// moved); those stale ticks are pruned whenever the set is read against its
/// store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ticks: BTreeSet<Tick>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tick: Tick) {
        self.ticks.insert(tick);
    }

    pub fn remove(&mut self, tick: Tick) -> bool {
        self.ticks.remove(&tick)
    }

    pub fn clear(&mut self) {
        self.ticks.clear();
    }

    /// Raw size, stale entries included.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Raw selected ticks, stale entries included.
    pub fn ticks(&self) -> impl Iterator<Item = Tick> + '_ {
        self.ticks.iter().copied()
    }

    /// True if `tick` is selected and still backed by an event. A stale entry is dropped.
    pub fn contains<T>(&mut self, tick: Tick, store: &TickEventStore<T>) -> bool {
        if !self.ticks.contains(&tick) {
            return false;
        }
        if store.contains(tick) {
            return true;
        }
        self.ticks.remove(&tick);
        false
    }

    /// Drop every entry whose event no longer exists.
    pub fn prune<T>(&mut self, store: &TickEventStore<T>) {
        self.ticks.retain(|t| store.contains(*t));
    }

    /// Earliest selected tick still backed by an event.
    pub fn first_tick<T>(&mut self, store: &TickEventStore<T>) -> Option<Tick> {
        self.prune(store);
        self.ticks.first().copied()
    }

    /// Replace the selection with every key of `store` in `[start, end]` (bounds in either order).
    pub fn shift_click_range<T>(&mut self, start: Tick, end: Tick, store: &TickEventStore<T>) {
        self.ticks.clear();
        let (lo, hi) = (start.min(end), start.max(end));
        self.ticks.extend(store.range(lo, hi).map(|(t, _)| t));
    }

    /// Selected events re-keyed as `tick - zero_tick`. Stale entries are pruned on the way.
    pub fn export_normalized_data<T: Clone>(
        &mut self,
        zero_tick: Tick,
        store: &TickEventStore<T>,
    ) -> TickMap<T> {
        let mut data = TickMap::new();
        self.ticks.retain(|&tick| match store.get(tick) {
            Some(value) => {
                data.insert(tick - zero_tick, value.clone());
                true
            }
            None => false,
        });
        data
    }

    /// Replace the selection with `{t + scalar | t in ticks}`.
    pub fn apply_scaled_selection<I>(&mut self, ticks: I, scalar: Tick)
    where
        I: IntoIterator<Item = Tick>,
    {
        self.ticks.clear();
        self.ticks
            .extend(ticks.into_iter().filter_map(|t| t.checked_add(scalar)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(ticks: &[Tick]) -> TickEventStore<char> {
        let mut store = TickEventStore::new();
        for (i, &t) in ticks.iter().enumerate() {
            store.add(t, (b'a' + i as u8) as char);
        }
        store
    }

    #[test]
    fn contains_prunes_stale_ticks() {
        let mut backing = store(&[10, 20]);
        let mut selection = SelectionSet::new();
        selection.add(10);
        selection.add(20);
        backing.remove(20);

        assert!(selection.contains(10, &backing));
        assert!(!selection.contains(20, &backing));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn shift_click_replaces_selection() {
        let backing = store(&[0, 100, 200, 300]);
        let mut selection = SelectionSet::new();
        selection.add(0);
        selection.shift_click_range(300, 100, &backing);
        assert_eq!(selection.ticks().collect::<Vec<_>>(), vec![100, 200, 300]);
    }

    #[test]
    fn export_normalized_data_rebases_and_prunes() {
        let mut backing = store(&[100, 300, 500]);
        let mut selection = SelectionSet::new();
        selection.add(100);
        selection.add(300);
        selection.add(500);
        backing.remove(500);

        let data = selection.export_normalized_data(100, &backing);
        assert_eq!(data.keys().copied().collect::<Vec<_>>(), vec![0, 200]);
        assert_eq!(data[&200], 'b');
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn apply_scaled_selection_moves_ticks() {
        let mut selection = SelectionSet::new();
        selection.add(5);
        selection.apply_scaled_selection([0, 200], 1000);
        assert_eq!(selection.ticks().collect::<Vec<_>>(), vec![1000, 1200]);
    }

    #[test]
    fn first_tick_ignores_stale_entries() {
        let backing = store(&[50]);
        let mut selection = SelectionSet::new();
        selection.add(10);
        selection.add(50);
        assert_eq!(selection.first_tick(&backing), Some(50));
    }
}
