use crate::selection::SelectionSet;
use crate::store::TickEventStore;
use crate::tick::{Tick, TickMap, TickSpan};

/// One tick map per lane, indexed by lane slot.
pub type LaneData<T> = Vec<TickMap<T>>;

/// Selected events of a lane group, re-keyed relative to the earliest selected tick.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSelection<T> {
    /// Absolute tick the data was normalized against
    pub origin: Tick,
    pub lanes: LaneData<T>,
}

impl<T> NormalizedSelection<T> {
    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(|lane| lane.is_empty())
    }

    pub fn event_count(&self) -> usize {
        self.lanes.iter().map(|lane| lane.len()).sum()
    }

    /// Distance from the first to the last selected tick.
    pub fn span_ticks(&self) -> Tick {
        self.lanes
            .iter()
            .filter_map(|lane| lane.keys().next_back().copied())
            .max()
            .unwrap_or(0)
    }
}

/// Lane slots listed from lowest to highest pitch.
///
/// Lane shifting walks this order instead of raw slot indices, so layouts that
/// store a low-pitched lane in a high slot shift correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneOrdering {
    order: Vec<usize>,
}

impl LaneOrdering {
    /// Panics unless `order` is a permutation of `0..order.len()`.
    pub fn new(order: Vec<usize>) -> Self {
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert!(
            sorted.iter().enumerate().all(|(i, lane)| i == *lane),
            "lane ordering {order:?} is not a permutation"
        );
        Self { order }
    }

    pub fn identity(lane_count: usize) -> Self {
        Self {
            order: (0..lane_count).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn lanes(&self) -> &[usize] {
        &self.order
    }

    /// Pitch position of a lane slot.
    pub fn position(&self, lane: usize) -> usize {
        self.order
            .iter()
            .position(|l| *l == lane)
            .unwrap_or_else(|| panic!("lane {lane} is not part of {:?}", self.order))
    }

    /// Lane reached by moving `steps` pitch positions, clamped to the outermost lanes.
    pub fn shift(&self, lane: usize, steps: i64) -> usize {
        if self.order.is_empty() {
            return lane;
        }
        let max = self.order.len() as i64 - 1;
        let position = (self.position(lane) as i64 + steps).clamp(0, max);
        self.order[position as usize]
    }

    /// Move every lane's data by `steps` pitch positions.
    ///
    /// Lanes pushed past either end collapse onto the boundary lane; when two
    /// sources land on the same tick, the higher-pitched source wins.
    pub fn permute<T: Clone>(&self, data: &[TickMap<T>], steps: i64) -> LaneData<T> {
        assert_eq!(data.len(), self.order.len(), "lane data does not match ordering");
        let mut shifted: LaneData<T> = vec![TickMap::new(); data.len()];
        for &lane in &self.order {
            let target = self.shift(lane, steps);
            shifted[target].extend(data[lane].iter().map(|(t, v)| (*t, v.clone())));
        }
        shifted
    }
}

#[derive(Debug, Clone)]
struct LaneSlot<T> {
    store: TickEventStore<T>,
    selection: SelectionSet,
}

/// Parallel event stores sharing one timeline, each with its own selection.
///
/// A chord at tick X is derived: two or more lanes hold an event at X.
#[derive(Debug, Clone)]
pub struct LaneGroup<T> {
    lanes: Vec<LaneSlot<T>>,
}

impl<T> LaneGroup<T> {
    pub fn new(lane_count: usize) -> Self {
        Self {
            lanes: (0..lane_count)
                .map(|_| LaneSlot {
                    store: TickEventStore::new(),
                    selection: SelectionSet::new(),
                })
                .collect(),
        }
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    fn slot(&self, lane: usize) -> &LaneSlot<T> {
        let count = self.lanes.len();
        self.lanes
            .get(lane)
            .unwrap_or_else(|| panic!("lane {lane} out of range ({count} lanes)"))
    }

    fn slot_mut(&mut self, lane: usize) -> &mut LaneSlot<T> {
        let count = self.lanes.len();
        self.lanes
            .get_mut(lane)
            .unwrap_or_else(|| panic!("lane {lane} out of range ({count} lanes)"))
    }

    pub fn store(&self, lane: usize) -> &TickEventStore<T> {
        &self.slot(lane).store
    }

    pub fn store_mut(&mut self, lane: usize) -> &mut TickEventStore<T> {
        &mut self.slot_mut(lane).store
    }

    pub fn selection(&self, lane: usize) -> &SelectionSet {
        &self.slot(lane).selection
    }

    pub fn selection_mut(&mut self, lane: usize) -> &mut SelectionSet {
        &mut self.slot_mut(lane).selection
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(|slot| slot.store.is_empty())
    }

    /// Total number of events across lanes.
    pub fn event_count(&self) -> usize {
        self.lanes.iter().map(|slot| slot.store.len()).sum()
    }

    pub fn tick_count_at(&self, tick: Tick) -> usize {
        self.lanes
            .iter()
            .filter(|slot| slot.store.contains(tick))
            .count()
    }

    pub fn is_chord_at(&self, tick: Tick) -> bool {
        self.tick_count_at(tick) >= 2
    }

    /// Lane slots holding an event at `tick`.
    pub fn lanes_at(&self, tick: Tick) -> Vec<usize> {
        (0..self.lanes.len())
            .filter(|&lane| self.lanes[lane].store.contains(tick))
            .collect()
    }

    /// Sorted, deduplicated union of every lane's ticks.
    pub fn unique_ticks(&self) -> Vec<Tick> {
        let mut ticks: Vec<Tick> = self.lanes.iter().flat_map(|slot| slot.store.ticks()).collect();
        ticks.sort_unstable();
        ticks.dedup();
        ticks
    }

    /// Previous tick in the union of all lanes.
    pub fn previous_tick(&self, tick: Tick, inclusive: bool) -> Option<Tick> {
        self.lanes
            .iter()
            .filter_map(|slot| slot.store.previous(tick, inclusive))
            .max()
    }

    /// Next tick in the union of all lanes.
    pub fn next_tick(&self, tick: Tick, inclusive: bool) -> Option<Tick> {
        self.lanes
            .iter()
            .filter_map(|slot| slot.store.next(tick, inclusive))
            .min()
    }

    /// Closest occupied ticks strictly before and after `tick`, across all lanes.
    pub fn tick_event_bounds(&self, tick: Tick) -> (Option<Tick>, Option<Tick>) {
        (self.previous_tick(tick, false), self.next_tick(tick, false))
    }

    /// `(lane, tick, event)` for every event with `start <= tick <= end`.
    pub fn events_in_range(&self, start: Tick, end: Tick) -> impl Iterator<Item = (usize, Tick, &T)> + '_ {
        self.lanes
            .iter()
            .enumerate()
            .flat_map(move |(lane, slot)| slot.store.range(start, end).map(move |(t, v)| (lane, t, v)))
    }

    /// Remove one event, scrubbing it from the lane's selection.
    pub fn pop_from_lane(&mut self, tick: Tick, lane: usize) -> Option<T> {
        let slot = self.slot_mut(lane);
        let value = slot.store.take(tick)?;
        slot.selection.remove(tick);
        Some(value)
    }

    /// Remove every lane's event at `tick`.
    pub fn pop_all_at_tick(&mut self, tick: Tick) -> Vec<(usize, T)> {
        (0..self.lanes.len())
            .filter_map(|lane| self.pop_from_lane(tick, lane).map(|v| (lane, v)))
            .collect()
    }

    /// Remove every event with `start <= tick <= end` on every lane.
    pub fn pop_range(&mut self, start: Tick, end: Tick) -> LaneData<T> {
        self.lanes
            .iter_mut()
            .map(|slot| {
                let removed = slot.store.pop_range(start, end);
                for tick in removed.keys() {
                    slot.selection.remove(*tick);
                }
                removed
            })
            .collect()
    }

    /// Replace every lane's content. Selections are left to prune lazily.
    pub fn replace_all(&mut self, data: LaneData<T>) {
        assert_eq!(data.len(), self.lanes.len(), "lane data does not match lane count");
        for (slot, lane_data) in self.lanes.iter_mut().zip(data) {
            slot.store.replace_all(lane_data);
        }
    }

    /// True if any lane has a selected tick still backed by an event.
    pub fn has_selection(&self) -> bool {
        self.lanes
            .iter()
            .any(|slot| slot.selection.ticks().any(|t| slot.store.contains(t)))
    }

    pub fn clear_selection(&mut self) {
        for slot in &mut self.lanes {
            slot.selection.clear();
        }
    }

    /// Select the event at `tick` on `lane`. Returns false if there is none.
    pub fn select(&mut self, lane: usize, tick: Tick) -> bool {
        let slot = self.slot_mut(lane);
        if !slot.store.contains(tick) {
            return false;
        }
        slot.selection.add(tick);
        true
    }

    /// Range-select `[start, end]` on every lane, replacing the current selection.
    pub fn select_range(&mut self, start: Tick, end: Tick) {
        for slot in &mut self.lanes {
            slot.selection.shift_click_range(start, end, &slot.store);
        }
    }

    pub fn select_all(&mut self) {
        for slot in &mut self.lanes {
            let ticks: Vec<Tick> = slot.store.ticks().collect();
            slot.selection.apply_scaled_selection(ticks, 0);
        }
    }

    /// Span from the earliest to the latest selected tick, stale entries ignored.
    pub fn selected_span(&self) -> Option<TickSpan> {
        TickSpan::of_keys(self.lanes.iter().flat_map(|slot| {
            slot.selection
                .ticks()
                .filter(|t| slot.store.contains(*t))
        }))
    }

    /// Remove every selected event.
    pub fn delete_selected(&mut self) -> Option<TickSpan> {
        let mut span = None;
        for slot in &mut self.lanes {
            let ticks: Vec<Tick> = slot.selection.ticks().collect();
            for tick in ticks {
                if slot.store.remove(tick) {
                    span = TickSpan::merge_opt(span, Some(TickSpan::at(tick)));
                }
            }
            slot.selection.clear();
        }
        span
    }

    /// Point each lane's selection at `data`'s keys shifted to `new_origin`.
    /// Event data is not touched.
    pub fn apply_scaled_selection(&mut self, data: &[TickMap<T>], new_origin: Tick) {
        assert_eq!(data.len(), self.lanes.len(), "lane data does not match lane count");
        for (slot, lane_data) in self.lanes.iter_mut().zip(data) {
            slot.selection
                .apply_scaled_selection(lane_data.keys().copied(), new_origin);
        }
    }
}

impl<T: Clone> LaneGroup<T> {
    /// Selected data of every lane, normalized to the earliest selected tick across lanes.
    pub fn export_normalized_selection(&mut self) -> Option<NormalizedSelection<T>> {
        let origin = self
            .lanes
            .iter_mut()
            .filter_map(|slot| slot.selection.first_tick(&slot.store))
            .min()?;
        let lanes = self
            .lanes
            .iter_mut()
            .map(|slot| slot.selection.export_normalized_data(origin, &slot.store))
            .collect();
        Some(NormalizedSelection { origin, lanes })
    }

    /// Write each lane's data at `tick + offset`, replacing what was there.
    pub fn overwrite_with_offset(&mut self, data: &[TickMap<T>], offset: Tick) -> Option<TickSpan> {
        assert_eq!(data.len(), self.lanes.len(), "lane data does not match lane count");
        self.lanes
            .iter_mut()
            .zip(data)
            .fold(None, |span, (slot, lane_data)| {
                TickSpan::merge_opt(span, slot.store.overwrite_with_offset(lane_data, offset))
            })
    }

    pub fn export_range(&self, start: Tick, end: Tick) -> LaneData<T> {
        self.lanes
            .iter()
            .map(|slot| slot.store.export_range(start, end))
            .collect()
    }

    pub fn export_all(&self) -> LaneData<T> {
        self.lanes.iter().map(|slot| slot.store.export_all()).collect()
    }
}
