use std::collections::BTreeSet;

use chart_model::line::format_chart_line;
use chart_model::{
    ChartError, IngestSummary, LaneData, LaneGroup, LocalEvent, NoteEvent, NoteFlag, RawEvent,
    Resolution, SpecialEvent, SpecialKind, Tick, TickEventStore, TickMap,
};

use crate::edit::validator::{hopo_cutoff_ticks, natural_flag, reclassify_range};
use crate::fret::{FORCED_MODIFIER, FretLane, TAP_MODIFIER};

/// One difficulty of one five-fret instrument.
#[derive(Debug, Clone)]
pub struct FiveFretTrack {
    resolution: Resolution,
    notes: LaneGroup<NoteEvent>,
    /// One lane per [`SpecialKind`]
    specials: LaneGroup<SpecialEvent>,
    local_events: TickEventStore<LocalEvent>,
}

impl FiveFretTrack {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            notes: LaneGroup::new(FretLane::COUNT),
            specials: LaneGroup::new(SpecialKind::COUNT),
            local_events: TickEventStore::new(),
        }
    }

    /// Track holding exactly `notes` and `specials`, flags reclassified.
    pub fn from_lane_data(
        resolution: Resolution,
        notes: LaneData<NoteEvent>,
        specials: LaneData<SpecialEvent>,
    ) -> Self {
        let mut track = Self::new(resolution);
        track.notes.replace_all(notes);
        track.specials.replace_all(specials);
        track.reclassify_all();
        track
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn notes(&self) -> &LaneGroup<NoteEvent> {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut LaneGroup<NoteEvent> {
        &mut self.notes
    }

    pub fn specials(&self) -> &LaneGroup<SpecialEvent> {
        &self.specials
    }

    pub fn specials_mut(&mut self) -> &mut LaneGroup<SpecialEvent> {
        &mut self.specials
    }

    pub fn local_events(&self) -> &TickEventStore<LocalEvent> {
        &self.local_events
    }

    pub fn local_events_mut(&mut self) -> &mut TickEventStore<LocalEvent> {
        &mut self.local_events
    }

    pub fn note(&self, tick: Tick, lane: FretLane) -> Option<&NoteEvent> {
        self.notes.store(lane.index()).get(tick)
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.specials.is_empty() && self.local_events.is_empty()
    }

    fn reclassify_all(&mut self) {
        reclassify_range(&mut self.notes, 0, Tick::MAX, hopo_cutoff_ticks(self.resolution));
    }

    /// Flag the classifier would give the notes at `tick`.
    pub fn natural_flag(&self, tick: Tick) -> NoteFlag {
        natural_flag(&self.notes, tick, hopo_cutoff_ticks(self.resolution))
    }

    /// Ingest the `(tick, raw)` lines of a track section.
    ///
    /// Forced and tap modifiers are applied after every note is in place,
    /// since "forced" is relative to the flag the classifier computes.
    pub fn add_events_from_lines<'a, I>(&mut self, lines: I) -> IngestSummary
    where
        I: IntoIterator<Item = (Tick, &'a str)>,
    {
        let mut summary = IngestSummary::default();
        let mut forced = BTreeSet::new();
        let mut tapped = BTreeSet::new();

        for (tick, raw) in lines {
            if tick < 0 {
                summary.skip(tick, raw, ChartError::NegativeTick(tick));
                continue;
            }
            let event = match RawEvent::parse(raw) {
                Ok(event) => event,
                Err(e) => {
                    summary.skip(tick, raw, e);
                    continue;
                }
            };
            match event {
                RawEvent::Note { fret, sustain } => match FretLane::from_chart_fret(fret) {
                    Some(lane) => {
                        self.notes.store_mut(lane.index()).add(tick, NoteEvent::new(sustain));
                        summary.accept();
                    }
                    None if fret == FORCED_MODIFIER => {
                        forced.insert(tick);
                    }
                    None if fret == TAP_MODIFIER => {
                        tapped.insert(tick);
                    }
                    None => summary.skip(tick, raw, ChartError::UnknownFret(fret)),
                },
                RawEvent::Special { code, length } => match SpecialKind::from_code(code) {
                    Ok(kind) => {
                        self.specials
                            .store_mut(kind.index())
                            .add(tick, SpecialEvent::new(kind, length));
                        summary.accept();
                    }
                    Err(e) => summary.skip(tick, raw, e),
                },
                RawEvent::Text { text, .. } => {
                    self.local_events.add(tick, LocalEvent::from_text(&text));
                    summary.accept();
                }
                _ => summary.skip(tick, raw, "not a track event"),
            }
        }

        self.reclassify_all();
        for tick in forced {
            if self.force_at(tick) {
                summary.accept();
            } else {
                summary.skip(tick, "N 5 0", "forced modifier without a note");
            }
        }
        for tick in tapped {
            if self.tap_at(tick) {
                summary.accept();
            } else {
                summary.skip(tick, "N 6 0", "tap modifier without a note");
            }
        }
        summary
    }

    /// Force every note at `tick` to the inverse of its computed flag.
    /// False if the tick is empty.
    pub(crate) fn force_at(&mut self, tick: Tick) -> bool {
        self.pin_at(tick, NoteEvent::forced(0))
    }

    /// Pin every note at `tick` to tap. False if the tick is empty.
    pub(crate) fn tap_at(&mut self, tick: Tick) -> bool {
        self.pin_at(tick, NoteEvent::pinned(0, NoteFlag::Tap))
    }

    fn pin_at(&mut self, tick: Tick, pin: NoteEvent) -> bool {
        let lanes = self.notes.lanes_at(tick);
        if lanes.is_empty() {
            return false;
        }
        let natural = self.natural_flag(tick);
        for lane in lanes {
            if let Some(note) = self.notes.store_mut(lane).get_mut(tick) {
                *note = NoteEvent {
                    sustain: note.sustain,
                    ..pin
                };
                note.resolve(natural);
            }
        }
        true
    }

    /// Modifier line needed to reproduce the pin at `tick`, if any.
    fn modifier_at(&self, tick: Tick) -> Option<u32> {
        let pinned = self
            .notes
            .lanes_at(tick)
            .into_iter()
            .filter_map(|lane| self.notes.store(lane).get(tick))
            .find(|note| !note.is_default)?;
        match pinned.flag {
            NoteFlag::Tap => Some(TAP_MODIFIER),
            _ if pinned.forced => Some(FORCED_MODIFIER),
            flag if flag != self.natural_flag(tick) => Some(FORCED_MODIFIER),
            _ => None,
        }
    }

    /// Track lines in tick order: notes, then modifiers, then specials, then text events.
    pub fn export_all_events(&self) -> Vec<String> {
        let mut lines: Vec<(Tick, u8, RawEvent)> = Vec::new();

        for tick in self.notes.unique_ticks() {
            for lane in self.notes.lanes_at(tick) {
                let (Some(fret), Some(note)) =
                    (FretLane::from_index(lane), self.notes.store(lane).get(tick))
                else {
                    continue;
                };
                lines.push((
                    tick,
                    0,
                    RawEvent::Note {
                        fret: fret.chart_fret(),
                        sustain: note.sustain,
                    },
                ));
            }
            if let Some(modifier) = self.modifier_at(tick) {
                lines.push((
                    tick,
                    1,
                    RawEvent::Note {
                        fret: modifier,
                        sustain: 0,
                    },
                ));
            }
        }

        for kind in SpecialKind::all() {
            for (tick, special) in self.specials.store(kind.index()).iter() {
                lines.push((
                    tick,
                    2,
                    RawEvent::Special {
                        code: special.kind.code(),
                        length: special.length,
                    },
                ));
            }
        }

        for (tick, event) in self.local_events.iter() {
            lines.push((
                tick,
                3,
                RawEvent::Text {
                    text: event.text().to_string(),
                    quoted: false,
                },
            ));
        }

        lines.sort_by_key(|(tick, order, _)| (*tick, *order));
        lines
            .iter()
            .map(|(tick, _, event)| format_chart_line(*tick, event))
            .collect()
    }

    /// Copy of this track at another resolution. Ticks and lengths are rounded.
    pub fn rescaled(&self, resolution: Resolution) -> Self {
        let scale = |tick: Tick| resolution.rescale_from(tick, self.resolution);
        let notes: LaneData<NoteEvent> = self
            .notes
            .export_all()
            .into_iter()
            .map(|lane| {
                lane.into_iter()
                    .map(|(tick, note)| {
                        (
                            scale(tick),
                            NoteEvent {
                                sustain: scale(note.sustain),
                                ..note
                            },
                        )
                    })
                    .collect::<TickMap<_>>()
            })
            .collect();
        let specials: LaneData<SpecialEvent> = self
            .specials
            .export_all()
            .into_iter()
            .map(|lane| {
                lane.into_iter()
                    .map(|(tick, special)| {
                        (scale(tick), SpecialEvent::new(special.kind, scale(special.length)))
                    })
                    .collect::<TickMap<_>>()
            })
            .collect();

        let mut track = Self::new(resolution);
        track.notes.replace_all(notes);
        track.specials.replace_all(specials);
        track
            .local_events
            .replace_all(self.local_events.iter().map(|(t, e)| (scale(t), e.clone())).collect());
        track.reclassify_all();
        track
    }
}
