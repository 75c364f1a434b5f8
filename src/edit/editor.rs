use chart_model::{
    ChartError, LaneData, NoteEvent, NoteFlag, NormalizedSelection, SpecialEvent, SpecialKind, Tick,
    TickMap, TickSpan,
};
use chart_timing::TempoMap;

use crate::edit::clipboard::{ClipboardContent, parse_clipboard, selection_to_string};
use crate::edit::transform::MoveTransform;
use crate::edit::validator::NoteValidator;
use crate::fret::FretLane;
use crate::track::FiveFretTrack;

/// Editing operations on one track.
///
/// Every mutation returns the affected span, after the validator has already
/// been run over it.
pub struct TrackEditor<'a> {
    track: &'a mut FiveFretTrack,
    tempo: &'a TempoMap,
    validator: NoteValidator,
    moves: &'a mut MoveTransform<NoteEvent>,
    clipboard: &'a mut Option<String>,
    clamp_to_song_length: bool,
}

impl<'a> TrackEditor<'a> {
    pub(crate) fn new(
        track: &'a mut FiveFretTrack,
        tempo: &'a TempoMap,
        validator: NoteValidator,
        moves: &'a mut MoveTransform<NoteEvent>,
        clipboard: &'a mut Option<String>,
        clamp_to_song_length: bool,
    ) -> Self {
        Self {
            track,
            tempo,
            validator,
            moves,
            clipboard,
            clamp_to_song_length,
        }
    }

    pub fn track(&self) -> &FiveFretTrack {
        self.track
    }

    /// Last tick edits may reach, when clamping to the song length.
    fn max_tick(&self) -> Option<Tick> {
        if self.clamp_to_song_length {
            self.tempo.song_length_ticks()
        } else {
            None
        }
    }

    fn in_bounds(&self, tick: Tick) -> bool {
        tick >= 0 && self.max_tick().is_none_or(|max| tick <= max)
    }

    fn revalidate(&mut self, span: Option<TickSpan>) -> Option<TickSpan> {
        if let Some(span) = span {
            self.validator.revalidate(self.track.notes_mut(), self.tempo, span);
        }
        span
    }

    // -----------------------------------------------------------------------
    // Notes
    // -----------------------------------------------------------------------

    /// Place a note. Open and fretted notes never share a tick, so the other
    /// kind is removed. A pin already at the tick carries over.
    pub fn add_note(&mut self, tick: Tick, lane: FretLane, sustain: Tick) -> Option<TickSpan> {
        if !self.in_bounds(tick) {
            tracing::debug!(tick, %lane, "Rejecting note outside the chart");
            return None;
        }
        let notes = self.track.notes_mut();
        if lane.is_open() {
            for fret in FretLane::all().into_iter().filter(|f| !f.is_open()) {
                notes.pop_from_lane(tick, fret.index());
            }
        } else {
            notes.pop_from_lane(tick, FretLane::Open.index());
        }

        let pinned = notes
            .lanes_at(tick)
            .into_iter()
            .filter_map(|l| notes.store(l).get(tick))
            .find(|note| !note.is_default)
            .copied();
        let note = match pinned {
            Some(pin) => NoteEvent { sustain: 0, ..pin },
            None => NoteEvent::new(0),
        };
        let span = notes.store_mut(lane.index()).add(tick, note);

        let sustain = self
            .validator
            .clamp_sustain(notes, self.tempo, tick, lane.index(), sustain);
        if let Some(note) = notes.store_mut(lane.index()).get_mut(tick) {
            note.sustain = sustain;
        }
        self.revalidate(span)
    }

    pub fn remove_note(&mut self, tick: Tick, lane: FretLane) -> Option<TickSpan> {
        self.track.notes_mut().pop_from_lane(tick, lane.index())?;
        self.revalidate(Some(TickSpan::at(tick)))
    }

    pub fn set_sustain(&mut self, tick: Tick, lane: FretLane, length: Tick) -> Option<TickSpan> {
        let notes = self.track.notes_mut();
        if !notes.store(lane.index()).contains(tick) {
            return None;
        }
        let clamped = self
            .validator
            .clamp_sustain(notes, self.tempo, tick, lane.index(), length);
        let note = notes.store_mut(lane.index()).get_mut(tick)?;
        note.sustain = clamped;
        Some(TickSpan::new(tick, tick.saturating_add(clamped)))
    }

    /// Release every pin at `tick` back to the classifier.
    fn unpin(&mut self, tick: Tick) {
        let notes = self.track.notes_mut();
        for lane in notes.lanes_at(tick) {
            if let Some(note) = notes.store_mut(lane).get_mut(tick) {
                note.release(NoteFlag::Strum);
            }
        }
        self.validator.reclassify_range(notes, tick, tick);
    }

    fn pin(&self, tick: Tick) -> Option<NoteEvent> {
        let notes = self.track.notes();
        notes
            .lanes_at(tick)
            .into_iter()
            .filter_map(|lane| notes.store(lane).get(tick))
            .find(|note| !note.is_default)
            .copied()
    }

    /// Pin the notes at `tick` to the inverse of their computed flag, or
    /// release an existing forced pin.
    pub fn toggle_forced(&mut self, tick: Tick) -> Option<TickSpan> {
        if self.track.notes().tick_count_at(tick) == 0 {
            return None;
        }
        match self.pin(tick) {
            Some(pin) if pin.forced => self.unpin(tick),
            _ => {
                self.track.force_at(tick);
            }
        }
        Some(TickSpan::at(tick))
    }

    /// Pin the notes at `tick` to tap, or release an existing tap pin.
    pub fn toggle_tap(&mut self, tick: Tick) -> Option<TickSpan> {
        if self.track.notes().tick_count_at(tick) == 0 {
            return None;
        }
        match self.pin(tick).map(|pin| pin.flag) {
            Some(NoteFlag::Tap) => self.unpin(tick),
            _ => {
                self.track.tap_at(tick);
            }
        }
        Some(TickSpan::at(tick))
    }

    // -----------------------------------------------------------------------
    // Specials
    // -----------------------------------------------------------------------

    /// Place a starpower phrase, shortened so it ends inside the chart.
    pub fn add_starpower(&mut self, tick: Tick, length: Tick) -> Option<TickSpan> {
        if !self.in_bounds(tick) {
            return None;
        }
        let length = match self.max_tick() {
            Some(max) => length.min(max - tick),
            None => length,
        };
        let kind = SpecialKind::Starpower;
        self.track
            .specials_mut()
            .store_mut(kind.index())
            .add(tick, SpecialEvent::new(kind, length))
            .map(|span| span.merge(TickSpan::at(tick.saturating_add(length.max(0)))))
    }

    pub fn remove_starpower(&mut self, tick: Tick) -> Option<TickSpan> {
        self.track
            .specials_mut()
            .pop_from_lane(tick, SpecialKind::Starpower.index())
            .map(|_| TickSpan::at(tick))
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Select the note under the pointer. Without `additive` the previous
    /// selection is dropped first.
    pub fn select_click(&mut self, tick: Tick, lane: FretLane, additive: bool) -> bool {
        if !additive {
            self.clear_selection();
        }
        self.track.notes_mut().select(lane.index(), tick)
    }

    /// Replace the selection with everything in `[start, end]`.
    pub fn shift_click(&mut self, start: Tick, end: Tick) {
        self.track.notes_mut().select_range(start, end);
        self.track.specials_mut().select_range(start, end);
    }

    pub fn select_all(&mut self) {
        self.track.notes_mut().select_all();
        self.track.specials_mut().select_all();
    }

    pub fn clear_selection(&mut self) {
        self.track.notes_mut().clear_selection();
        self.track.specials_mut().clear_selection();
    }

    pub fn selected_span(&self) -> Option<TickSpan> {
        TickSpan::merge_opt(
            self.track.notes().selected_span(),
            self.track.specials().selected_span(),
        )
    }

    pub fn delete_selection(&mut self) -> Option<TickSpan> {
        let notes = self.track.notes_mut().delete_selected();
        let specials = self.track.specials_mut().delete_selected();
        let span = self.revalidate(notes);
        TickSpan::merge_opt(span, specials)
    }

    // -----------------------------------------------------------------------
    // Clipboard
    // -----------------------------------------------------------------------

    /// Copy the selection to the clipboard, normalized to its earliest tick.
    pub fn copy_selection(&mut self) -> Option<String> {
        let notes = self.track.notes_mut().export_normalized_selection();
        let specials = self.track.specials_mut().export_normalized_selection();
        let origin = notes.iter().map(|s| s.origin).chain(specials.iter().map(|s| s.origin)).min()?;

        let content = ClipboardContent {
            notes: rebase(notes, origin, FretLane::COUNT),
            specials: rebase(specials, origin, SpecialKind::COUNT),
        };
        let text = selection_to_string(self.track.resolution(), &content);
        tracing::debug!(events = content.event_count(), origin, "Copied selection");
        *self.clipboard = Some(text.clone());
        Some(text)
    }

    /// Paste the clipboard with its first event at `tick`.
    pub fn paste(&mut self, tick: Tick) -> Result<Option<TickSpan>, ChartError> {
        match self.clipboard.clone() {
            Some(text) => self.paste_text(&text, tick),
            None => Ok(None),
        }
    }

    /// Paste clipboard-formatted text with its first event at `tick`. The
    /// pasted events become the selection. Events past the song end are dropped.
    pub fn paste_text(&mut self, text: &str, tick: Tick) -> Result<Option<TickSpan>, ChartError> {
        let mut content = parse_clipboard(text, self.track.resolution())?;
        let tick = tick.max(0);
        if let Some(max) = self.max_tick() {
            let limit = max - tick;
            for lane in content.notes.iter_mut() {
                lane.retain(|t, _| *t <= limit);
            }
            for lane in content.specials.iter_mut() {
                lane.retain(|t, _| *t <= limit);
            }
        }
        if content.is_empty() {
            return Ok(None);
        }

        self.clear_selection();
        let notes_span = self.track.notes_mut().overwrite_with_offset(&content.notes, tick);
        self.track.notes_mut().apply_scaled_selection(&content.notes, tick);
        let specials_span = self
            .track
            .specials_mut()
            .overwrite_with_offset(&content.specials, tick);
        self.track
            .specials_mut()
            .apply_scaled_selection(&content.specials, tick);

        let span = self.revalidate(notes_span);
        Ok(TickSpan::merge_opt(span, specials_span))
    }

    // -----------------------------------------------------------------------
    // Dragging
    // -----------------------------------------------------------------------

    pub fn pointer_pressed(&mut self, tick: Tick, lane: FretLane) {
        self.moves.pointer_pressed(tick, lane.index());
    }

    /// Ghost span of the dragged selection, if a drag is running.
    pub fn pointer_moved(&mut self, tick: Tick, lane: FretLane) -> Option<TickSpan> {
        let max_tick = self.max_tick();
        self.moves
            .pointer_moved(self.track.notes_mut(), tick, lane.index(), max_tick)
    }

    /// Commit a running drag and revalidate around both its ends.
    pub fn pointer_released(&mut self) -> Option<TickSpan> {
        let span = self.moves.commit();
        self.revalidate(span)
    }

    pub fn cancel_move(&mut self) -> bool {
        self.moves.cancel(self.track.notes_mut())
    }

    pub fn is_dragging(&self) -> bool {
        self.moves.is_dragging()
    }
}

/// Re-key normalized data from its own origin to `origin`.
fn rebase<T: Clone>(selection: Option<NormalizedSelection<T>>, origin: Tick, lanes: usize) -> LaneData<T> {
    match selection {
        Some(selection) => {
            let shift = selection.origin - origin;
            selection
                .lanes
                .into_iter()
                .map(|lane| lane.into_iter().map(|(t, v)| (t + shift, v)).collect::<TickMap<T>>())
                .collect()
        }
        None => vec![TickMap::new(); lanes],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorSettings;
    use crate::test_utils::builders::TrackBuilder;

    fn flag_at(editor: &TrackEditor<'_>, tick: Tick, lane: FretLane) -> (NoteFlag, bool) {
        let note = editor.track().note(tick, lane).unwrap();
        (note.flag, note.is_default)
    }

    #[test]
    fn add_note_reclassifies_neighbours() {
        let mut session = TrackBuilder::new()
            .note(0, FretLane::Green)
            .note(100, FretLane::Red)
            .into_session(EditorSettings::default());
        let mut editor = session.editor();

        assert_eq!(editor.add_note(50, FretLane::Yellow, 0), Some(TickSpan::at(50)));
        assert_eq!(flag_at(&editor, 50, FretLane::Yellow), (NoteFlag::Hopo, true));
        assert_eq!(flag_at(&editor, 100, FretLane::Red), (NoteFlag::Hopo, true));

        editor.remove_note(50, FretLane::Yellow);
        assert_eq!(flag_at(&editor, 100, FretLane::Red), (NoteFlag::Strum, true));
        assert!(editor.remove_note(50, FretLane::Yellow).is_none());
    }

    #[test]
    fn open_and_fretted_notes_exclude_each_other() {
        let mut session = TrackBuilder::new()
            .chord(0, &[FretLane::Green, FretLane::Red])
            .into_session(EditorSettings::default());
        let mut editor = session.editor();

        editor.add_note(0, FretLane::Open, 0);
        assert_eq!(editor.track().notes().lanes_at(0), vec![FretLane::Open.index()]);
        editor.add_note(0, FretLane::Blue, 0);
        assert_eq!(editor.track().notes().lanes_at(0), vec![FretLane::Blue.index()]);
    }

    #[test]
    fn add_note_clamps_sustain() {
        let mut session = TrackBuilder::new()
            .note(384, FretLane::Red)
            .into_session(EditorSettings::default());
        let mut editor = session.editor();

        editor.add_note(0, FretLane::Green, 5000);
        assert_eq!(editor.track().note(0, FretLane::Green).unwrap().sustain, 384);
        assert_eq!(editor.set_sustain(0, FretLane::Green, 200), Some(TickSpan::new(0, 200)));
        assert!(editor.set_sustain(10, FretLane::Green, 200).is_none());
    }

    #[test]
    fn notes_past_song_end_are_rejected() {
        let mut session = TrackBuilder::new().into_session(EditorSettings::default());
        session.tempo_mut().set_song_length(Some(1.0));
        let mut editor = session.editor();
        assert!(editor.add_note(385, FretLane::Green, 0).is_none());
        assert!(editor.add_note(384, FretLane::Green, 0).is_some());
        assert!(editor.add_note(-1, FretLane::Green, 0).is_none());
    }

    #[test]
    fn toggles_pin_and_release() {
        let mut session = TrackBuilder::new()
            .note(0, FretLane::Green)
            .note(48, FretLane::Red)
            .into_session(EditorSettings::default());
        let mut editor = session.editor();

        editor.toggle_forced(48);
        assert_eq!(flag_at(&editor, 48, FretLane::Red), (NoteFlag::Strum, false));
        editor.toggle_forced(48);
        assert_eq!(flag_at(&editor, 48, FretLane::Red), (NoteFlag::Hopo, true));

        editor.toggle_tap(48);
        assert_eq!(flag_at(&editor, 48, FretLane::Red), (NoteFlag::Tap, false));
        // forced over a tap replaces it
        editor.toggle_forced(48);
        assert_eq!(flag_at(&editor, 48, FretLane::Red), (NoteFlag::Strum, false));
        editor.toggle_tap(48);
        editor.toggle_tap(48);
        assert_eq!(flag_at(&editor, 48, FretLane::Red), (NoteFlag::Hopo, true));

        assert!(editor.toggle_forced(500).is_none());
    }

    #[test]
    fn added_note_joins_pinned_chord() {
        let mut session = TrackBuilder::new()
            .pinned(0, FretLane::Green, NoteFlag::Tap)
            .into_session(EditorSettings::default());
        let mut editor = session.editor();
        editor.add_note(0, FretLane::Red, 0);
        assert_eq!(flag_at(&editor, 0, FretLane::Red), (NoteFlag::Tap, false));
    }

    #[test]
    fn starpower_is_kept_inside_song() {
        let mut session = TrackBuilder::new().into_session(EditorSettings::default());
        session.tempo_mut().set_song_length(Some(2.0));
        let mut editor = session.editor();
        assert_eq!(editor.add_starpower(384, 1000), Some(TickSpan::new(384, 768)));
        let stored = editor
            .track()
            .specials()
            .store(SpecialKind::Starpower.index())
            .get(384)
            .unwrap()
            .length;
        assert_eq!(stored, 384);
        assert_eq!(editor.remove_starpower(384), Some(TickSpan::at(384)));
        assert!(editor.remove_starpower(384).is_none());
    }

    #[test]
    fn delete_selection_spans_notes_and_specials() {
        let mut session = TrackBuilder::new()
            .note(0, FretLane::Green)
            .note(100, FretLane::Red)
            .starpower(300, 192)
            .note(600, FretLane::Blue)
            .into_session(EditorSettings::default());
        let mut editor = session.editor();

        editor.shift_click(50, 400);
        assert_eq!(editor.selected_span(), Some(TickSpan::new(100, 300)));
        assert_eq!(editor.delete_selection(), Some(TickSpan::new(100, 300)));
        assert_eq!(editor.track().notes().unique_ticks(), vec![0, 600]);
        assert!(editor.track().specials().is_empty());
    }

    #[test]
    fn copy_normalizes_across_notes_and_specials() {
        let mut session = TrackBuilder::new()
            .note(200, FretLane::Green)
            .starpower(100, 96)
            .into_session(EditorSettings::default());
        let mut editor = session.editor();
        editor.select_all();
        let text = editor.copy_selection().unwrap();
        assert_eq!(text, "Resolution = 192\n0 = S 2 96\n100 = N 0 0\n");

        editor.clear_selection();
        assert!(editor.copy_selection().is_none());
    }

    #[test]
    fn paste_drops_events_past_song_end() {
        let mut session = TrackBuilder::new().into_session(EditorSettings::default());
        session.tempo_mut().set_song_length(Some(1.0));
        let mut editor = session.editor();
        let span = editor
            .paste_text("0 = N 0 0\n100 = N 1 0\n200 = N 2 0", 250)
            .unwrap();
        assert_eq!(span, Some(TickSpan::new(250, 350)));
        assert_eq!(editor.track().notes().unique_ticks(), vec![250, 350]);
        assert_eq!(editor.selected_span(), Some(TickSpan::new(250, 350)));
        assert_eq!(editor.paste(0), Ok(None));
    }

    #[test]
    fn extreme_ticks_and_lengths_are_clamped() {
        let mut session = TrackBuilder::new()
            .sustain(100, FretLane::Green, Tick::MAX)
            .into_session(EditorSettings::default());
        let mut editor = session.editor();

        editor.add_note(500, FretLane::Red, 0);
        assert_eq!(editor.track().note(100, FretLane::Green).unwrap().sustain, 400);
        assert_eq!(
            editor.set_sustain(500, FretLane::Red, Tick::MAX),
            Some(TickSpan::new(500, Tick::MAX))
        );
        assert!(editor.add_starpower(Tick::MAX - 10, Tick::MAX).is_some());

        let span = editor.paste_text("0 = N 0 0\n100 = N 1 0", Tick::MAX - 50).unwrap();
        assert_eq!(span, Some(TickSpan::at(Tick::MAX - 50)));
        assert!(editor.track().note(Tick::MAX - 50, FretLane::Green).is_some());
    }

    #[test]
    fn drag_commit_revalidates_both_ends() {
        let mut session = TrackBuilder::new()
            .note(0, FretLane::Green)
            .note(50, FretLane::Red)
            .note(100, FretLane::Yellow)
            .into_session(EditorSettings::default());
        let mut editor = session.editor();
        assert_eq!(flag_at(&editor, 100, FretLane::Yellow), (NoteFlag::Hopo, true));

        editor.select_click(50, FretLane::Red, false);
        editor.pointer_pressed(50, FretLane::Red);
        assert_eq!(editor.pointer_moved(1000, FretLane::Blue), Some(TickSpan::at(1000)));
        assert!(editor.is_dragging());
        assert_eq!(editor.pointer_released(), Some(TickSpan::new(50, 1000)));

        // two lanes up the pitch order: red lands on blue
        assert!(editor.track().note(50, FretLane::Red).is_none());
        assert_eq!(flag_at(&editor, 1000, FretLane::Blue), (NoteFlag::Strum, true));
        // 100 lost its close predecessor
        assert_eq!(flag_at(&editor, 100, FretLane::Yellow), (NoteFlag::Strum, true));
    }
}
