use chart_model::line::split_chart_line;
use chart_model::{LaneGroup, NoteEvent, Resolution, Tick};
use chart_timing::TempoMap;
use fretchart::edit::validator::{NoteValidator, hopo_cutoff_ticks, reclassify_range};
use fretchart::{EditorSettings, FiveFretTrack, FretLane};
use proptest::prelude::*;

/// (tick, lane slot, sustain, modifier) where modifier 1 = forced, 2 = tap
type NoteSpec = (Tick, usize, Tick, u8);

fn chart_lines(notes: &[NoteSpec]) -> Vec<String> {
    let mut lines = Vec::new();
    for &(tick, lane, sustain, modifier) in notes {
        let fret = FretLane::from_index(lane).unwrap().chart_fret();
        lines.push(format!("{tick} = N {fret} {sustain}"));
        match modifier {
            1 => lines.push(format!("{tick} = N 5 0")),
            2 => lines.push(format!("{tick} = N 6 0")),
            _ => {}
        }
    }
    lines
}

fn ingest(lines: &[String]) -> FiveFretTrack {
    let mut track = FiveFretTrack::new(Resolution::new(192).unwrap());
    let parsed: Vec<(Tick, &str)> = lines.iter().map(|l| split_chart_line(l).unwrap()).collect();
    let summary = track.add_events_from_lines(parsed);
    assert_eq!(summary.skipped, 0);
    track
}

fn lane_group(notes: &[NoteSpec]) -> LaneGroup<NoteEvent> {
    let mut group = LaneGroup::new(FretLane::COUNT);
    for &(tick, lane, sustain, _) in notes {
        group.store_mut(lane).add(tick, NoteEvent::new(sustain));
    }
    group
}

fn note_specs() -> impl Strategy<Value = Vec<NoteSpec>> {
    prop::collection::vec((0i64..4_000, 0usize..FretLane::COUNT, 0i64..400, 0u8..3), 0..60)
}

proptest! {
    #[test]
    fn export_then_ingest_keeps_every_note(notes in note_specs()) {
        let first = ingest(&chart_lines(&notes));
        let exported = first.export_all_events();
        let second = ingest(&exported);

        prop_assert_eq!(second.notes().export_all(), first.notes().export_all());
        prop_assert_eq!(second.export_all_events(), exported);
    }

    #[test]
    fn reclassification_is_idempotent(notes in note_specs()) {
        let cutoff = hopo_cutoff_ticks(Resolution::new(192).unwrap());
        let mut group = lane_group(&notes);

        reclassify_range(&mut group, 0, Tick::MAX, cutoff);
        let once = group.export_all();
        reclassify_range(&mut group, 0, Tick::MAX, cutoff);
        prop_assert_eq!(group.export_all(), once);
    }

    #[test]
    fn clamped_sustain_stays_in_bounds(
        notes in note_specs(),
        tick in prop_oneof![0i64..4_000, 0i64..=Tick::MAX],
        lane in 0usize..FretLane::COUNT,
        candidate in prop_oneof![-100i64..6_000, any::<i64>()],
        extended in any::<bool>(),
        song_length in prop::option::of(1.0f64..1.0e6),
    ) {
        let resolution = Resolution::new(192).unwrap();
        let settings = EditorSettings {
            extended_sustains: extended,
            sustain_gap_enabled: true,
            ..EditorSettings::default()
        };
        let validator = NoteValidator::new(resolution, &settings);
        let mut tempo = TempoMap::new(resolution);
        tempo.set_song_length(song_length);
        let group = lane_group(&notes);

        let clamped = validator.clamp_sustain(&group, &tempo, tick, lane, candidate);
        prop_assert!(clamped >= 0);
        prop_assert!(clamped <= candidate.max(0));

        let per_lane = extended && !FretLane::from_index(lane).unwrap().is_open();
        let boundary = if per_lane {
            group.store(lane).next(tick, false)
        } else {
            group.next_tick(tick, false)
        };
        if clamped > 0 {
            match (boundary, tempo.song_length_ticks()) {
                (Some(next), _) => prop_assert!(clamped <= next - tick - validator.sustain_gap()),
                (None, Some(end)) => prop_assert!(clamped <= end.saturating_sub(tick)),
                (None, None) => prop_assert_eq!(clamped, candidate),
            }
            prop_assert!(tempo.duration_seconds(tick, clamped) >= 0.2);
        }
    }
}
