use chart_model::{
    ChartError, Resolution, TempoEvent, Tick, TickEventStore, TickSpan, TimeSignatureEvent,
};

/// Lowest BPM an anchor solve may produce.
pub const MIN_BPM: f64 = 0.001;
/// Highest BPM an anchor solve may produce.
pub const MAX_BPM: f64 = 100_000.0;

/// BPM and time signature changes of one chart, with tick <-> seconds conversion.
///
/// Both stores always hold an event at tick 0 and that tick is protected.
/// BPM timestamps are derived data: every structural change to the BPM store
/// must be followed by [`TempoMap::recalculate`]. The convenience editors on
/// this type do that themselves.
#[derive(Debug, Clone)]
pub struct TempoMap {
    resolution: Resolution,
    bpms: TickEventStore<TempoEvent>,
    time_signatures: TickEventStore<TimeSignatureEvent>,
    /// Seconds, once the audio side reports it
    song_length: Option<f64>,
}

impl Default for TempoMap {
    fn default() -> Self {
        Self::new(Resolution::DEFAULT)
    }
}

impl TempoMap {
    pub fn new(resolution: Resolution) -> Self {
        let mut bpms = TickEventStore::with_protected([0]);
        bpms.add(0, TempoEvent::default());
        let mut time_signatures = TickEventStore::with_protected([0]);
        time_signatures.add(0, TimeSignatureEvent::default());
        Self {
            resolution,
            bpms,
            time_signatures,
            song_length: None,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn bpm_store(&self) -> &TickEventStore<TempoEvent> {
        &self.bpms
    }

    /// Raw BPM store access. Callers must run [`TempoMap::recalculate`] afterwards.
    pub fn bpm_store_mut(&mut self) -> &mut TickEventStore<TempoEvent> {
        &mut self.bpms
    }

    pub fn time_signature_store(&self) -> &TickEventStore<TimeSignatureEvent> {
        &self.time_signatures
    }

    pub fn time_signature_store_mut(&mut self) -> &mut TickEventStore<TimeSignatureEvent> {
        &mut self.time_signatures
    }

    // -----------------------------------------------------------------------
    // Song length
    // -----------------------------------------------------------------------

    pub fn set_song_length(&mut self, seconds: Option<f64>) {
        self.song_length = seconds.filter(|s| s.is_finite() && *s >= 0.0);
    }

    pub fn song_length_seconds(&self) -> Option<f64> {
        self.song_length
    }

    pub fn song_length_ticks(&self) -> Option<Tick> {
        self.song_length
            .map(|seconds| self.seconds_to_tick_unclamped(seconds).max(0))
    }

    /// Clamp a tick into `[0, song_length_ticks]`; no upper bound while the length is unknown.
    pub fn clamp_tick(&self, tick: Tick) -> Tick {
        let tick = tick.max(0);
        match self.song_length_ticks() {
            Some(max) => tick.min(max),
            None => tick,
        }
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Last BPM event at or before `tick`.
    fn tempo_before(&self, tick: Tick) -> (Tick, TempoEvent) {
        self.bpms
            .previous(tick, true)
            .or_else(|| self.bpms.first_tick())
            .and_then(|t| self.bpms.get(t).map(|event| (t, *event)))
            .unwrap_or((0, TempoEvent::default()))
    }

    /// Last time signature at or before `tick`.
    pub fn time_signature_at(&self, tick: Tick) -> (Tick, TimeSignatureEvent) {
        self.time_signatures
            .previous(tick, true)
            .or_else(|| self.time_signatures.first_tick())
            .and_then(|t| self.time_signatures.get(t).map(|event| (t, *event)))
            .unwrap_or((0, TimeSignatureEvent::default()))
    }

    pub fn bpm_at(&self, tick: Tick) -> f64 {
        self.tempo_before(tick).1.bpm
    }

    // -----------------------------------------------------------------------
    // Conversion
    // -----------------------------------------------------------------------

    pub fn tick_to_seconds(&self, tick: Tick) -> f64 {
        if tick == 0 {
            return 0.0;
        }
        let (event_tick, event) = self.tempo_before(tick);
        event.timestamp
            + (tick - event_tick) as f64 / self.resolution.as_f64() * 60.0 / event.bpm
    }

    /// Tick length of `[tick, tick + length]` in seconds.
    pub fn duration_seconds(&self, tick: Tick, length: Tick) -> f64 {
        self.tick_to_seconds(tick.saturating_add(length)) - self.tick_to_seconds(tick)
    }

    fn seconds_to_tick_unclamped(&self, seconds: f64) -> Tick {
        let (event_tick, event) = self
            .bpms
            .last_matching(|_, event| event.timestamp <= seconds)
            .map(|(t, event)| (t, *event))
            .unwrap_or_else(|| self.tempo_before(0));
        let ticks = self.resolution.as_f64() * event.bpm * (seconds - event.timestamp) / 60.0;
        event_tick.saturating_add(ticks.round() as Tick)
    }

    /// Inverse of [`TempoMap::tick_to_seconds`], clamped to `[0, song_length_ticks]`.
    pub fn seconds_to_tick(&self, seconds: f64) -> Tick {
        self.clamp_tick(self.seconds_to_tick_unclamped(seconds))
    }

    // -----------------------------------------------------------------------
    // Recalculation
    // -----------------------------------------------------------------------

    /// Rederive every BPM timestamp after `from_tick`.
    ///
    /// Walking forward, an unanchored event takes its timestamp from its
    /// predecessor. An anchored event keeps its timestamp and the predecessor's
    /// BPM is solved to meet it instead. An anchor that no BPM in
    /// `[MIN_BPM, MAX_BPM]` can reach from its predecessor is released.
    pub fn recalculate(&mut self, from_tick: Tick) {
        let resolution = self.resolution;
        let ticks: Vec<Tick> = self.bpms.ticks().collect();
        for pair in ticks.windows(2) {
            let (previous_tick, tick) = (pair[0], pair[1]);
            if tick <= from_tick {
                continue;
            }
            let (Some(previous), Some(current)) =
                (self.bpms.get(previous_tick).copied(), self.bpms.get(tick).copied())
            else {
                continue;
            };

            if current.anchored {
                match solve_bpm(resolution, previous_tick, previous.timestamp, tick, current.timestamp) {
                    Some(solved) => {
                        if let Some(event) = self.bpms.get_mut(previous_tick) {
                            event.bpm = solved;
                        }
                        continue;
                    }
                    None => log::warn!(
                        "Releasing anchor at {tick}: {:.6}s is unreachable from {previous_tick}",
                        current.timestamp
                    ),
                }
            }
            if let Some(event) = self.bpms.get_mut(tick) {
                let beats = (tick - previous_tick) as f64 / resolution.as_f64();
                event.anchored = false;
                event.timestamp = previous.timestamp + beats * 60.0 / previous.bpm;
            }
        }
    }

    /// Recalculation start for an edit at `tick`: the event before it, so the
    /// edited event's own timestamp is rederived.
    fn recalc_origin(&self, tick: Tick) -> Tick {
        self.bpms.previous(tick, false).unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Insert or change a BPM event. An existing anchor at `tick` stays pinned.
    pub fn set_bpm(&mut self, tick: Tick, bpm: f64) -> Result<Option<TickSpan>, ChartError> {
        if tick < 0 {
            return Err(ChartError::NegativeTick(tick));
        }
        let mut event = TempoEvent::new(bpm)?;
        if let Some(existing) = self.bpms.get(tick) {
            event.anchored = existing.anchored;
            event.timestamp = existing.timestamp;
        }
        let span = self.bpms.add(tick, event);
        self.recalculate(self.recalc_origin(tick));
        Ok(span)
    }

    /// Remove a BPM event. Tick 0 is protected.
    pub fn remove_bpm(&mut self, tick: Tick) -> Option<TickSpan> {
        self.bpms.take(tick)?;
        self.recalculate(self.recalc_origin(tick));
        Some(TickSpan::at(tick))
    }

    /// Move a BPM event, replacing whatever sits at `to`.
    pub fn move_bpm(&mut self, from: Tick, to: Tick) -> Option<TickSpan> {
        if to < 0 || from == to {
            return None;
        }
        let event = self.bpms.take(from)?;
        self.bpms.add(to, event);
        self.recalculate(self.recalc_origin(from.min(to)));
        Some(TickSpan::new(from, to))
    }

    /// Pin the BPM event at `tick` to its current timestamp.
    pub fn anchor(&mut self, tick: Tick) -> bool {
        match self.bpms.get_mut(tick) {
            Some(event) => {
                event.anchored = true;
                true
            }
            None => false,
        }
    }

    /// Pin the BPM event at `tick` to `seconds`, solving the preceding BPM.
    ///
    /// Rejected when `seconds` is not after the preceding event's timestamp or
    /// the solved BPM would leave `[MIN_BPM, MAX_BPM]`.
    pub fn anchor_at(&mut self, tick: Tick, seconds: f64) -> bool {
        if !self.bpms.contains(tick) {
            return false;
        }
        let Some(previous_tick) = self.bpms.previous(tick, false) else {
            return false;
        };
        let Some(previous) = self.bpms.get(previous_tick).copied() else {
            return false;
        };
        if solve_bpm(self.resolution, previous_tick, previous.timestamp, tick, seconds).is_none() {
            log::debug!("Rejecting anchor at {tick}: {seconds}s is unreachable from {previous_tick}");
            return false;
        }
        if let Some(event) = self.bpms.get_mut(tick) {
            event.anchored = true;
            event.timestamp = seconds;
        }
        self.recalculate(previous_tick);
        true
    }

    pub fn unanchor(&mut self, tick: Tick) -> bool {
        let unpinned = match self.bpms.get_mut(tick) {
            Some(event) if event.anchored => {
                event.anchored = false;
                true
            }
            _ => false,
        };
        if unpinned {
            self.recalculate(self.recalc_origin(tick));
        }
        unpinned
    }

    pub fn set_time_signature(
        &mut self,
        tick: Tick,
        numerator: u32,
        denominator: u32,
    ) -> Result<Option<TickSpan>, ChartError> {
        if tick < 0 {
            return Err(ChartError::NegativeTick(tick));
        }
        let event = TimeSignatureEvent::new(numerator, denominator)?;
        Ok(self.time_signatures.add(tick, event))
    }

    /// Remove a time signature. Tick 0 is protected.
    pub fn remove_time_signature(&mut self, tick: Tick) -> bool {
        self.time_signatures.remove(tick)
    }
}

/// BPM that covers `from..to` in exactly `to_seconds - from_seconds`, if it is in range.
fn solve_bpm(resolution: Resolution, from: Tick, from_seconds: f64, to: Tick, to_seconds: f64) -> Option<f64> {
    let elapsed = to_seconds - from_seconds;
    if !elapsed.is_finite() || elapsed <= 0.0 {
        return None;
    }
    let beats = (to - from) as f64 / resolution.as_f64();
    let bpm = beats / elapsed * 60.0;
    (MIN_BPM..=MAX_BPM).contains(&bpm).then_some(bpm)
}
