//! Test utilities for building tracks and sessions.
//!
//! This module provides helpers for creating test fixtures in a fluent manner.

#[cfg(test)]
pub mod builders {
    use chart_model::{NoteEvent, NoteFlag, Resolution, SpecialEvent, SpecialKind, Tick};

    use crate::config::EditorSettings;
    use crate::fret::FretLane;
    use crate::session::ChartSession;
    use crate::track::FiveFretTrack;

    /// Builder for five-fret tracks at resolution 192.
    #[derive(Debug, Clone)]
    pub struct TrackBuilder {
        track: FiveFretTrack,
    }

    impl Default for TrackBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TrackBuilder {
        pub fn new() -> Self {
            Self {
                track: FiveFretTrack::new(Resolution::new(192).unwrap()),
            }
        }

        /// Add a note without sustain.
        pub fn note(self, tick: Tick, lane: FretLane) -> Self {
            self.sustain(tick, lane, 0)
        }

        /// Add a note held for `length` ticks.
        pub fn sustain(mut self, tick: Tick, lane: FretLane, length: Tick) -> Self {
            self.track
                .notes_mut()
                .store_mut(lane.index())
                .add(tick, NoteEvent::new(length));
            self
        }

        /// Add a note with a pinned flag.
        pub fn pinned(mut self, tick: Tick, lane: FretLane, flag: NoteFlag) -> Self {
            self.track
                .notes_mut()
                .store_mut(lane.index())
                .add(tick, NoteEvent::pinned(0, flag));
            self
        }

        /// Add one note per lane at `tick`.
        pub fn chord(self, tick: Tick, lanes: &[FretLane]) -> Self {
            lanes.iter().fold(self, |builder, lane| builder.note(tick, *lane))
        }

        pub fn starpower(mut self, tick: Tick, length: Tick) -> Self {
            self.track
                .specials_mut()
                .store_mut(SpecialKind::Starpower.index())
                .add(tick, SpecialEvent::new(SpecialKind::Starpower, length));
            self
        }

        /// Build with flags left as inserted.
        pub fn build(self) -> FiveFretTrack {
            self.track
        }

        /// Build into the active track of a fresh session.
        pub fn into_session(self, settings: EditorSettings) -> ChartSession {
            let track = self.track;
            let mut session = ChartSession::new(track.resolution(), settings);
            let lines = track.export_all_events();
            let parsed: Vec<(Tick, &str)> = lines
                .iter()
                .map(|line| chart_model::line::split_chart_line(line).unwrap())
                .collect();
            let section = session.active_track().section_name();
            session.load_section(&section, parsed);
            session
        }
    }
}
