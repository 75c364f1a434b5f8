#![no_main]

use chart_model::line::{format_chart_line, parse_chart_line, split_chart_line};
use chart_model::{Resolution, Tick};
use chart_timing::TempoMap;
use fretchart::FiveFretTrack;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // A line that parses must format to a line that parses the same way.
    for line in text.lines() {
        if let Ok((tick, event)) = parse_chart_line(line) {
            let formatted = format_chart_line(tick, &event);
            let reparsed = parse_chart_line(&formatted);
            assert_eq!(reparsed.ok(), Some((tick, event)));
        }
    }

    let lines: Vec<(Tick, &str)> = text
        .lines()
        .filter_map(|line| split_chart_line(line).ok())
        .collect();

    let mut tempo = TempoMap::new(Resolution::DEFAULT);
    tempo.add_events_from_lines(lines.iter().copied());
    let mut previous = 0.0;
    for (tick, _) in tempo.bpm_store().iter() {
        let seconds = tempo.tick_to_seconds(tick);
        assert!(seconds >= previous);
        previous = seconds;
    }

    let mut track = FiveFretTrack::new(Resolution::DEFAULT);
    track.add_events_from_lines(lines.iter().copied());
    let _ = track.export_all_events();
});
