use chart_model::Tick;

use crate::tempo_map::TempoMap;

/// Grid line kind at a tick, measured from the governing time signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarlineType {
    None,
    Bar,
    /// One beat (denominator note)
    Division,
    /// Half a beat
    HalfDivision,
}

impl TempoMap {
    /// Grid step used for beat lines: half a beat when that divides evenly.
    fn grid_step(&self, tick: Tick) -> Tick {
        let (_, signature) = self.time_signature_at(tick);
        let beat = signature.beat_ticks(self.resolution());
        if beat % 2 == 0 { beat / 2 } else { beat }
    }

    pub fn barline_type(&self, tick: Tick) -> BarlineType {
        if tick < 0 {
            return BarlineType::None;
        }
        let (signature_tick, signature) = self.time_signature_at(tick);
        let resolution = self.resolution();
        let distance = tick - signature_tick;
        let beat = signature.beat_ticks(resolution);

        if distance % signature.bar_ticks(resolution) == 0 {
            BarlineType::Bar
        } else if distance % beat == 0 {
            BarlineType::Division
        } else if beat % 2 == 0 && distance % (beat / 2) == 0 {
            BarlineType::HalfDivision
        } else {
            BarlineType::None
        }
    }

    /// Start of the bar containing `tick`.
    pub fn last_barline(&self, tick: Tick) -> Tick {
        let (signature_tick, signature) = self.time_signature_at(tick);
        let bar = signature.bar_ticks(self.resolution());
        signature_tick + (tick - signature_tick).div_euclid(bar) * bar
    }

    /// First grid line strictly after `tick`. A time signature change always
    /// starts a new bar, even off the previous grid. `None` past the song end.
    pub fn next_beatline_event(&self, tick: Tick) -> Option<(Tick, BarlineType)> {
        let (signature_tick, _) = self.time_signature_at(tick);
        let step = self.grid_step(tick);
        let next_on_grid = (tick - signature_tick)
            .div_euclid(step)
            .checked_add(1)?
            .checked_mul(step)?
            .checked_add(signature_tick)?;

        let next = match self.time_signature_store().next(tick, false) {
            Some(change) if change <= next_on_grid => (change, BarlineType::Bar),
            _ => (next_on_grid, self.barline_type(next_on_grid)),
        };
        match self.song_length_ticks() {
            Some(end) if next.0 > end => None,
            _ => Some(next),
        }
    }

    /// Every grid line in `[start, end]`, in order.
    pub fn beat_lines(&self, start: Tick, end: Tick) -> impl Iterator<Item = (Tick, BarlineType)> + '_ {
        let start = start.max(0);
        let first = match self.barline_type(start) {
            BarlineType::None => self.next_beatline_event(start),
            kind => Some((start, kind)),
        };
        std::iter::successors(first, move |(tick, _)| self.next_beatline_event(*tick))
            .take_while(move |(tick, _)| *tick <= end)
    }

    /// Tick length of `bars` bars starting at `start_tick`.
    ///
    /// A time signature change cuts the running bar short and the walk
    /// continues in the new signature.
    pub fn bars_to_ticks(&self, start_tick: Tick, bars: u32) -> Tick {
        let resolution = self.resolution();
        let mut position = start_tick.max(0);
        for _ in 0..bars {
            let (_, signature) = self.time_signature_at(position);
            let bar_end = position.saturating_add(signature.bar_ticks(resolution));
            position = match self.time_signature_store().next(position, false) {
                Some(change) if change < bar_end => change,
                _ => bar_end,
            };
        }
        position - start_tick.max(0)
    }
}
