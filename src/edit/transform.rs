use chart_model::{LaneData, LaneGroup, LaneOrdering, NormalizedSelection, Tick, TickSpan};

/// Snapshot taken when a drag begins.
#[derive(Debug, Clone)]
struct Drag<T> {
    first_mouse_tick: Tick,
    first_lane: usize,
    selection: NormalizedSelection<T>,
    /// Every lane's data with the selection taken out
    pre_move: LaneData<T>,
    /// Where the selection currently sits, once it has been moved at all
    ghost: Option<TickSpan>,
}

impl<T> Drag<T> {
    fn origin_span(&self) -> TickSpan {
        TickSpan::new(
            self.selection.origin,
            self.selection.origin + self.selection.span_ticks(),
        )
    }
}

#[derive(Debug, Clone)]
enum MoveState<T> {
    Idle,
    /// Pointer is down; a drag starts once it moves to another tick or lane
    Armed { tick: Tick, lane: usize },
    Dragging(Box<Drag<T>>),
}

/// Drag-to-move for the selected events of a lane group.
///
/// While dragging, every pointer update restores the pre-move snapshot and
/// writes the selection again at its new ghost position, so the live data is
/// always consistent. Nothing is revalidated until the drag is committed.
#[derive(Debug, Clone)]
pub struct MoveTransform<T> {
    ordering: LaneOrdering,
    state: MoveState<T>,
}

impl<T: Clone> MoveTransform<T> {
    pub fn new(ordering: LaneOrdering) -> Self {
        Self {
            ordering,
            state: MoveState::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, MoveState::Dragging(_))
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, MoveState::Idle)
    }

    /// Current ghost span while dragging.
    pub fn ghost_span(&self) -> Option<TickSpan> {
        match &self.state {
            MoveState::Dragging(drag) => drag.ghost,
            _ => None,
        }
    }

    pub fn pointer_pressed(&mut self, tick: Tick, lane: usize) {
        if self.is_idle() {
            self.state = MoveState::Armed { tick, lane };
        }
    }

    /// Follow the pointer. Starts the drag on the first tick or lane change
    /// if `group` has a selection. Returns the ghost span after the update.
    ///
    /// `max_tick` bounds the end of the moved data.
    pub fn pointer_moved(
        &mut self,
        group: &mut LaneGroup<T>,
        tick: Tick,
        lane: usize,
        max_tick: Option<Tick>,
    ) -> Option<TickSpan> {
        if let MoveState::Armed {
            tick: pressed_tick,
            lane: pressed_lane,
        } = self.state
        {
            if pressed_tick == tick && pressed_lane == lane {
                return None;
            }
            if !self.start(group, pressed_tick, pressed_lane) {
                self.state = MoveState::Idle;
                return None;
            }
        }
        self.drag_to(group, tick, lane, max_tick)
    }

    /// Capture the selection and the pre-move snapshot. False if nothing is selected.
    pub fn start(&mut self, group: &mut LaneGroup<T>, tick: Tick, lane: usize) -> bool {
        let Some(selection) = group.export_normalized_selection() else {
            return false;
        };
        let mut pre_move = group.export_all();
        for (lane_data, selected) in pre_move.iter_mut().zip(&selection.lanes) {
            for offset in selected.keys() {
                lane_data.remove(&(selection.origin + offset));
            }
        }
        tracing::debug!(
            events = selection.event_count(),
            origin = selection.origin,
            "Move started"
        );
        self.state = MoveState::Dragging(Box::new(Drag {
            first_mouse_tick: tick,
            first_lane: lane,
            selection,
            pre_move,
            ghost: None,
        }));
        true
    }

    /// Place the selection at the position implied by the pointer.
    pub fn drag_to(
        &mut self,
        group: &mut LaneGroup<T>,
        tick: Tick,
        lane: usize,
        max_tick: Option<Tick>,
    ) -> Option<TickSpan> {
        let MoveState::Dragging(drag) = &mut self.state else {
            return None;
        };

        let span = drag.selection.span_ticks();
        let destination = drag
            .selection
            .origin
            .saturating_add(tick.saturating_sub(drag.first_mouse_tick))
            .min(max_tick.unwrap_or(Tick::MAX) - span)
            .max(0);

        let steps = self.ordering.position(lane) as i64 - self.ordering.position(drag.first_lane) as i64;
        let shifted = self.ordering.permute(&drag.selection.lanes, steps);

        group.replace_all(drag.pre_move.clone());
        group.overwrite_with_offset(&shifted, destination);
        group.apply_scaled_selection(&shifted, destination);

        let ghost = TickSpan::new(destination, destination + span);
        drag.ghost = Some(ghost);
        Some(ghost)
    }

    /// End the drag, keeping the ghost placement. Returns the span that needs
    /// revalidation: where the selection started merged with where it ended.
    pub fn commit(&mut self) -> Option<TickSpan> {
        match std::mem::replace(&mut self.state, MoveState::Idle) {
            MoveState::Dragging(drag) => {
                let ghost = drag.ghost?;
                tracing::debug!(start = ghost.start, end = ghost.end, "Move committed");
                Some(ghost.merge(drag.origin_span()))
            }
            _ => None,
        }
    }

    /// Abort the drag and put the selection back where it started.
    pub fn cancel(&mut self, group: &mut LaneGroup<T>) -> bool {
        match std::mem::replace(&mut self.state, MoveState::Idle) {
            MoveState::Dragging(drag) => {
                if drag.ghost.is_some() {
                    let Drag {
                        selection, pre_move, ..
                    } = *drag;
                    group.replace_all(pre_move);
                    group.overwrite_with_offset(&selection.lanes, selection.origin);
                    group.apply_scaled_selection(&selection.lanes, selection.origin);
                }
                true
            }
            MoveState::Armed { .. } => true,
            MoveState::Idle => false,
        }
    }
}
