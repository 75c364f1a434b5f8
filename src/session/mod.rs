mod track_id;

pub use track_id::{Difficulty, Instrument, TrackId};

use std::collections::BTreeMap;

use chart_model::line::format_chart_line;
use chart_model::{
    GlobalEvent, IngestSummary, NoteEvent, RawEvent, Resolution, Tick, TickEventStore,
};
use chart_timing::TempoMap;

use crate::config::EditorSettings;
use crate::edit::TrackEditor;
use crate::edit::transform::MoveTransform;
use crate::edit::validator::NoteValidator;
use crate::fret::FretLane;
use crate::traits::playback::PlaybackClock;
use crate::track::FiveFretTrack;

pub const SYNC_TRACK_SECTION: &str = "SyncTrack";
pub const EVENTS_SECTION: &str = "Events";

/// Everything that belongs to one loaded chart.
///
/// Built when a chart is loaded and dropped when it is unloaded. Editing goes
/// through [`ChartSession::editor`], which works on the active track.
pub struct ChartSession {
    resolution: Resolution,
    settings: EditorSettings,
    tempo: TempoMap,
    global_events: TickEventStore<GlobalEvent>,
    tracks: BTreeMap<TrackId, FiveFretTrack>,
    active: TrackId,
    moves: MoveTransform<NoteEvent>,
    clipboard: Option<String>,
}

impl ChartSession {
    pub fn new(resolution: Resolution, settings: EditorSettings) -> Self {
        Self {
            resolution,
            settings,
            tempo: TempoMap::new(resolution),
            global_events: TickEventStore::new(),
            tracks: BTreeMap::new(),
            active: TrackId::default(),
            moves: MoveTransform::new(FretLane::pitch_ordering()),
            clipboard: None,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: EditorSettings) {
        self.settings = settings;
    }

    pub fn validator(&self) -> NoteValidator {
        NoteValidator::new(self.resolution, &self.settings)
    }

    pub fn tempo(&self) -> &TempoMap {
        &self.tempo
    }

    pub fn tempo_mut(&mut self) -> &mut TempoMap {
        &mut self.tempo
    }

    pub fn global_events(&self) -> &TickEventStore<GlobalEvent> {
        &self.global_events
    }

    pub fn global_events_mut(&mut self) -> &mut TickEventStore<GlobalEvent> {
        &mut self.global_events
    }

    pub fn track(&self, id: TrackId) -> Option<&FiveFretTrack> {
        self.tracks.get(&id)
    }

    /// Tracks holding at least one event.
    pub fn track_ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks
            .iter()
            .filter(|(_, track)| !track.is_empty())
            .map(|(id, _)| *id)
    }

    pub fn active_track(&self) -> TrackId {
        self.active
    }

    /// Switch the edited track. A drag in progress on the old track is cancelled.
    pub fn set_active_track(&mut self, id: TrackId) {
        if id == self.active {
            return;
        }
        if let Some(track) = self.tracks.get_mut(&self.active)
            && self.moves.cancel(track.notes_mut())
        {
            tracing::debug!(track = %self.active, "Cancelled move on track switch");
        }
        self.active = id;
    }

    pub fn clipboard(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }

    /// Editor for the active track, creating the track if it has no data yet.
    pub fn editor(&mut self) -> TrackEditor<'_> {
        let validator = NoteValidator::new(self.resolution, &self.settings);
        let resolution = self.resolution;
        let track = self
            .tracks
            .entry(self.active)
            .or_insert_with(|| FiveFretTrack::new(resolution));
        TrackEditor::new(
            track,
            &self.tempo,
            validator,
            &mut self.moves,
            &mut self.clipboard,
            self.settings.clamp_to_song_length,
        )
    }

    // -----------------------------------------------------------------------
    // Section IO
    // -----------------------------------------------------------------------

    /// Feed one section's `(tick, raw)` lines into the session.
    /// Returns `None` for sections that hold no chart events.
    pub fn load_section<'a, I>(&mut self, name: &str, lines: I) -> Option<IngestSummary>
    where
        I: IntoIterator<Item = (Tick, &'a str)>,
    {
        let summary = match name {
            SYNC_TRACK_SECTION => self.tempo.add_events_from_lines(lines),
            EVENTS_SECTION => self.load_global_events(lines),
            _ => {
                let Some(id) = TrackId::from_section_name(name) else {
                    tracing::warn!(section = name, "Skipping unsupported section");
                    return None;
                };
                let resolution = self.resolution;
                self.tracks
                    .entry(id)
                    .or_insert_with(|| FiveFretTrack::new(resolution))
                    .add_events_from_lines(lines)
            }
        };
        if summary.skipped > 0 {
            tracing::warn!(
                section = name,
                skipped = summary.skipped,
                "Section loaded with skipped lines"
            );
        } else {
            tracing::debug!(section = name, accepted = summary.accepted, "Section loaded");
        }
        Some(summary)
    }

    fn load_global_events<'a, I>(&mut self, lines: I) -> IngestSummary
    where
        I: IntoIterator<Item = (Tick, &'a str)>,
    {
        let mut summary = IngestSummary::default();
        for (tick, raw) in lines {
            match RawEvent::parse(raw) {
                Ok(RawEvent::Text { text, .. }) => {
                    if self.global_events.add(tick, GlobalEvent::from_text(&text)).is_some() {
                        summary.accept();
                    } else {
                        summary.skip(tick, raw, "negative tick");
                    }
                }
                Ok(_) => summary.skip(tick, raw, "not a global event"),
                Err(e) => summary.skip(tick, raw, e),
            }
        }
        summary
    }

    fn export_global_events(&self) -> Vec<String> {
        self.global_events
            .iter()
            .map(|(tick, event)| {
                format_chart_line(
                    tick,
                    &RawEvent::Text {
                        text: event.text(),
                        quoted: true,
                    },
                )
            })
            .collect()
    }

    /// Every section as `(name, lines)`: sync track, events, then each
    /// non-empty track hardest first.
    pub fn export_sections(&self) -> Vec<(String, Vec<String>)> {
        let mut sections = vec![
            (SYNC_TRACK_SECTION.to_string(), self.tempo.export_all_events()),
            (EVENTS_SECTION.to_string(), self.export_global_events()),
        ];
        sections.extend(
            self.tracks
                .iter()
                .filter(|(_, track)| !track.is_empty())
                .map(|(id, track)| (id.section_name(), track.export_all_events())),
        );
        sections
    }

    // -----------------------------------------------------------------------
    // Playback boundary
    // -----------------------------------------------------------------------

    /// Pick up the audio length, which bounds tick clamping.
    pub fn sync_song_length(&mut self, clock: &dyn PlaybackClock) {
        self.tempo.set_song_length(clock.song_length_seconds());
    }

    pub fn playback_tick(&self, clock: &dyn PlaybackClock) -> Tick {
        self.tempo.seconds_to_tick(clock.current_playback_seconds())
    }
}
