use chart_model::{LaneGroup, NoteEvent, NoteFlag, Resolution, Tick, TickSpan};
use chart_timing::TempoMap;

use crate::config::EditorSettings;
use crate::fret::FretLane;

/// Sustains shorter than this after clamping are dropped.
pub const MIN_SUSTAIN_SECONDS: f64 = 0.2;

/// Largest gap to the previous note that still makes a HOPO: 65/192 of a beat.
pub fn hopo_cutoff_ticks(resolution: Resolution) -> Tick {
    (65 * resolution.ticks_per_quarter() as Tick) / 192
}

fn classify(previous: Option<Tick>, tick: Tick, is_chord: bool, hopo_cutoff: Tick) -> NoteFlag {
    match previous {
        Some(previous) if tick - previous < hopo_cutoff && !is_chord => NoteFlag::Hopo,
        _ => NoteFlag::Strum,
    }
}

/// Flag the classifier gives the notes at `tick`, ignoring pins.
pub fn natural_flag(notes: &LaneGroup<NoteEvent>, tick: Tick, hopo_cutoff: Tick) -> NoteFlag {
    classify(
        notes.previous_tick(tick, false),
        tick,
        notes.is_chord_at(tick),
        hopo_cutoff,
    )
}

/// Write the classifier's flag into every note in `[start, end]`.
///
/// Forced notes take the inverse of the computed flag; tap pins are left alone.
pub fn reclassify_range(notes: &mut LaneGroup<NoteEvent>, start: Tick, end: Tick, hopo_cutoff: Tick) {
    let ticks = notes.unique_ticks();
    let lo = ticks.partition_point(|t| *t < start);
    let hi = ticks.partition_point(|t| *t <= end);

    for index in lo..hi {
        let tick = ticks[index];
        let previous = index.checked_sub(1).map(|i| ticks[i]);
        let flag = classify(previous, tick, notes.is_chord_at(tick), hopo_cutoff);
        for lane in notes.lanes_at(tick) {
            if let Some(note) = notes.store_mut(lane).get_mut(tick) {
                note.resolve(flag);
            }
        }
    }
}

/// HOPO classification and sustain clamping for five-fret notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteValidator {
    hopo_cutoff: Tick,
    sustain_gap: Tick,
    extended_sustains: bool,
}

impl NoteValidator {
    pub fn new(resolution: Resolution, settings: &EditorSettings) -> Self {
        Self {
            hopo_cutoff: hopo_cutoff_ticks(resolution),
            sustain_gap: settings.sustain_gap_ticks(resolution),
            extended_sustains: settings.extended_sustains,
        }
    }

    pub fn hopo_cutoff(&self) -> Tick {
        self.hopo_cutoff
    }

    pub fn sustain_gap(&self) -> Tick {
        self.sustain_gap
    }

    /// Reapply the classifier to every occupied tick in `[start, end]`.
    /// Pinned notes are left alone.
    pub fn reclassify_range(&self, notes: &mut LaneGroup<NoteEvent>, start: Tick, end: Tick) {
        reclassify_range(notes, start, end, self.hopo_cutoff);
    }

    /// Next tick a sustain starting at `tick` on `lane` must stop before.
    fn sustain_boundary(&self, notes: &LaneGroup<NoteEvent>, tick: Tick, lane: usize) -> Option<Tick> {
        let per_lane = self.extended_sustains
            && FretLane::from_index(lane).is_some_and(|fret| !fret.is_open());
        if per_lane {
            notes.store(lane).next(tick, false)
        } else {
            notes.next_tick(tick, false)
        }
    }

    /// Sustain length allowed for a note at `tick` on `lane`.
    ///
    /// The result stops `sustain_gap` ticks short of the next note (or at the
    /// song end when no note follows), is never negative, and is zero when it
    /// would last less than [`MIN_SUSTAIN_SECONDS`].
    pub fn clamp_sustain(
        &self,
        notes: &LaneGroup<NoteEvent>,
        tempo: &TempoMap,
        tick: Tick,
        lane: usize,
        candidate: Tick,
    ) -> Tick {
        let mut length = candidate.max(0);
        match self.sustain_boundary(notes, tick, lane) {
            Some(boundary) => {
                let room = boundary.saturating_sub(tick).saturating_sub(self.sustain_gap);
                if length >= room {
                    length = room;
                }
            }
            None => {
                if let Some(end) = tempo.song_length_ticks() {
                    length = length.min(end.saturating_sub(tick));
                }
            }
        }

        let length = length.max(0);
        if length > 0 && tempo.duration_seconds(tick, length) < MIN_SUSTAIN_SECONDS {
            return 0;
        }
        length
    }

    /// Revalidate after an edit touching `span`.
    ///
    /// Classification reaches one occupied tick past the span, since its
    /// predecessor may have changed. Sustain clamping reaches back to each
    /// lane's last note before the span, whose boundary may have moved.
    pub fn revalidate(&self, notes: &mut LaneGroup<NoteEvent>, tempo: &TempoMap, span: TickSpan) {
        let classify_end = notes.next_tick(span.end, false).unwrap_or(span.end);
        self.reclassify_range(notes, span.start, classify_end);

        let clamp_start = (0..notes.lane_count())
            .filter_map(|lane| notes.store(lane).previous(span.start, false))
            .chain(notes.previous_tick(span.start, false))
            .min()
            .unwrap_or(span.start);

        let sustained: Vec<(usize, Tick, Tick)> = notes
            .events_in_range(clamp_start, span.end)
            .filter(|(_, _, note)| note.sustain > 0)
            .map(|(lane, tick, note)| (lane, tick, note.sustain))
            .collect();
        for (lane, tick, sustain) in sustained {
            let clamped = self.clamp_sustain(notes, tempo, tick, lane, sustain);
            if clamped != sustain
                && let Some(note) = notes.store_mut(lane).get_mut(tick)
            {
                tracing::debug!(tick, lane, sustain, clamped, "Clamped sustain");
                note.sustain = clamped;
            }
        }
    }
}
