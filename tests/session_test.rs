use chart_model::line::split_chart_line;
use chart_model::{IngestSummary, NoteFlag, Resolution, Tick};
use fretchart::traits::playback::MockPlaybackClock;
use fretchart::{ChartSession, Difficulty, EditorSettings, FretLane, Instrument, TrackId};

const SYNC_TRACK: &[&str] = &[
    "0 = TS 4",
    "0 = B 120000",
    "768 = TS 3",
    "768 = B 150000",
    "1536 = TS 6 3",
    "1536 = B 90000",
    "1536 = A 3600000",
];

const EVENTS: &[&str] = &["0 = E \"section Intro\"", "768 = E \"section Verse\""];

const EXPERT_GUITAR: &[&str] = &[
    "0 = N 0 0",
    "48 = N 1 0",
    "48 = N 5 0",
    "192 = N 0 96",
    "192 = N 2 96",
    "192 = S 2 384",
    "384 = N 7 0",
    "400 = N 4 0",
    "400 = N 6 0",
    "768 = E solo",
    "960 = E soloend",
];

const HARD_BASS: &[&str] = &["0 = N 1 0"];

fn load(session: &mut ChartSession, name: &str, lines: &[&str]) -> Option<IngestSummary> {
    let parsed: Vec<(Tick, &str)> = lines.iter().map(|l| split_chart_line(l).unwrap()).collect();
    session.load_section(name, parsed)
}

fn loaded_session() -> ChartSession {
    let mut session = ChartSession::new(Resolution::new(192).unwrap(), EditorSettings::default());
    load(&mut session, "SyncTrack", SYNC_TRACK).unwrap();
    load(&mut session, "Events", EVENTS).unwrap();
    load(&mut session, "ExpertSingle", EXPERT_GUITAR).unwrap();
    load(&mut session, "HardDoubleBass", HARD_BASS).unwrap();
    session
}

#[test]
fn test_sections_export_as_loaded() {
    let session = loaded_session();
    let sections = session.export_sections();
    let names: Vec<&str> = sections.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["SyncTrack", "Events", "ExpertSingle", "HardDoubleBass"]);

    assert_eq!(sections[0].1, SYNC_TRACK);
    assert_eq!(sections[1].1, EVENTS);
    assert_eq!(sections[2].1, EXPERT_GUITAR);
    assert_eq!(sections[3].1, HARD_BASS);
}

#[test]
fn test_modifiers_pin_flags() {
    let session = loaded_session();
    let track = session.track(TrackId::default()).unwrap();

    let forced = track.note(48, FretLane::Red).unwrap();
    assert_eq!((forced.flag, forced.is_default), (NoteFlag::Strum, false));
    let tap = track.note(400, FretLane::Orange).unwrap();
    assert_eq!((tap.flag, tap.is_default), (NoteFlag::Tap, false));
    let chord = track.note(192, FretLane::Yellow).unwrap();
    assert_eq!((chord.flag, chord.is_default), (NoteFlag::Strum, true));
}

#[test]
fn test_malformed_lines_are_skipped() {
    let mut session = ChartSession::new(Resolution::new(192).unwrap(), EditorSettings::default());
    let summary = load(
        &mut session,
        "ExpertSingle",
        &["0 = N 0 0", "96 = N 9 0", "192 = Q 1", "288 = N 1", "300 = N 5 0", "384 = N 2 0"],
    )
    .unwrap();
    assert_eq!(summary, IngestSummary { accepted: 2, skipped: 4 });

    let summary = load(&mut session, "SyncTrack", &["0 = B 0", "192 = TS 4 40", "384 = A 100"]).unwrap();
    assert_eq!(summary.accepted, 0);
    assert_eq!(summary.skipped, 3);
    assert!(load(&mut session, "ExpertDrums", &["0 = N 0 0"]).is_none());
}

#[test]
fn test_track_ids_list_loaded_tracks() {
    let mut session = loaded_session();
    let ids: Vec<TrackId> = session.track_ids().collect();
    assert_eq!(
        ids,
        vec![
            TrackId::new(Instrument::Guitar, Difficulty::Expert),
            TrackId::new(Instrument::Bass, Difficulty::Hard),
        ]
    );

    // An editor on an empty track does not make it exportable
    session.set_active_track(TrackId::new(Instrument::Keys, Difficulty::Easy));
    session.editor().clear_selection();
    assert_eq!(session.track_ids().count(), 2);

    session.editor().add_note(0, FretLane::Open, 0);
    assert_eq!(session.export_sections().last().unwrap().0, "EasyKeyboard");
}

#[test]
fn test_clipboard_carries_across_tracks() {
    let mut session = loaded_session();
    {
        let mut editor = session.editor();
        editor.shift_click(0, 48);
        editor.copy_selection().unwrap();
    }
    session.set_active_track(TrackId::new(Instrument::Bass, Difficulty::Hard));
    session.editor().paste(768).unwrap();

    let bass = session.track(TrackId::new(Instrument::Bass, Difficulty::Hard)).unwrap();
    assert!(bass.note(768, FretLane::Green).is_some());
    let pasted = bass.note(816, FretLane::Red).unwrap();
    assert_eq!((pasted.flag, pasted.is_default), (NoteFlag::Strum, false));
}

#[test]
fn test_playback_clock_bounds_edits() {
    let mut session = loaded_session();
    let clock = MockPlaybackClock::new(Some(2.0));
    session.sync_song_length(&clock);
    assert_eq!(session.tempo().song_length_ticks(), Some(768));

    clock.seek(1.0);
    assert_eq!(session.playback_tick(&clock), 384);
    clock.advance(5.0);
    assert_eq!(session.playback_tick(&clock), 768);

    assert!(session.editor().add_note(800, FretLane::Green, 0).is_none());
}

#[test]
fn test_forced_note_keeps_modifier_after_neighbour_edits() {
    let lines = ["0 = N 0 0", "48 = N 1 0", "48 = N 5 0"];
    let mut session = ChartSession::new(Resolution::new(192).unwrap(), EditorSettings::default());
    load(&mut session, "ExpertSingle", &lines).unwrap();

    // without its neighbour the forced note inverts to hopo
    session.editor().remove_note(0, FretLane::Green);
    let live = *session.track(TrackId::default()).unwrap().note(48, FretLane::Red).unwrap();
    assert_eq!((live.flag, live.forced), (NoteFlag::Hopo, true));

    let exported = session.export_sections().pop().unwrap().1;
    assert_eq!(exported, vec!["48 = N 1 0", "48 = N 5 0"]);

    let mut reloaded = ChartSession::new(Resolution::new(192).unwrap(), EditorSettings::default());
    let exported: Vec<&str> = exported.iter().map(String::as_str).collect();
    load(&mut reloaded, "ExpertSingle", &exported).unwrap();
    let restored = reloaded.track(TrackId::default()).unwrap().note(48, FretLane::Red).copied();
    assert_eq!(restored, Some(live));

    // both copies follow the classifier the same way afterwards
    session.editor().add_note(20, FretLane::Green, 0);
    reloaded.editor().add_note(20, FretLane::Green, 0);
    let flag = |s: &ChartSession| s.track(TrackId::default()).unwrap().note(48, FretLane::Red).unwrap().flag;
    assert_eq!(flag(&session), NoteFlag::Strum);
    assert_eq!(flag(&reloaded), NoteFlag::Strum);
}
