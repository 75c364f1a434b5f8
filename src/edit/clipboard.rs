//! Clipboard text for copied selections.
//!
//! The text uses the track line grammar, preceded by a resolution header so
//! that a paste into a chart with another resolution can rescale:
//!
//! ```text
//! Resolution = 192
//! 0 = N 0 0
//! 200 = N 1 96
//! 200 = S 2 192
//! ```

use chart_model::line::split_chart_line;
use chart_model::{ChartError, LaneData, NoteEvent, Resolution, SpecialEvent};

use crate::track::FiveFretTrack;

const RESOLUTION_KEY: &str = "Resolution";

/// Selected notes and specials, normalized so the earliest event sits at tick 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardContent {
    pub notes: LaneData<NoteEvent>,
    pub specials: LaneData<SpecialEvent>,
}

impl ClipboardContent {
    pub fn is_empty(&self) -> bool {
        self.notes.iter().all(|lane| lane.is_empty()) && self.specials.iter().all(|lane| lane.is_empty())
    }

    pub fn event_count(&self) -> usize {
        self.notes.iter().map(|lane| lane.len()).sum::<usize>()
            + self.specials.iter().map(|lane| lane.len()).sum::<usize>()
    }
}

/// Render copied data as clipboard text.
pub fn selection_to_string(resolution: Resolution, content: &ClipboardContent) -> String {
    let track = FiveFretTrack::from_lane_data(resolution, content.notes.clone(), content.specials.clone());
    let mut text = format!("{RESOLUTION_KEY} = {}\n", resolution.ticks_per_quarter());
    for line in track.export_all_events() {
        text.push_str(&line);
        text.push('\n');
    }
    text
}

/// Parse clipboard text into data at `destination` resolution.
///
/// A missing header means the text already uses `destination`. Lines that do
/// not parse are logged and skipped; only a malformed header is an error.
pub fn parse_clipboard(text: &str, destination: Resolution) -> Result<ClipboardContent, ChartError> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty()).peekable();

    let header = lines.peek().copied().and_then(|line| line.split_once('='));
    let source = match header {
        Some((key, value)) if key.trim() == RESOLUTION_KEY => {
            lines.next();
            let value = value.trim();
            let ticks: u32 = value.parse().map_err(|_| ChartError::InvalidNumber {
                field: "resolution",
                value: value.to_string(),
            })?;
            Resolution::new(ticks)?
        }
        _ => destination,
    };

    let mut events = Vec::new();
    for line in lines {
        match split_chart_line(line) {
            Ok(event) => events.push(event),
            Err(e) => tracing::warn!("Skipping clipboard line `{line}`: {e}"),
        }
    }

    let mut scratch = FiveFretTrack::new(source);
    let summary = scratch.add_events_from_lines(events);
    tracing::debug!(
        accepted = summary.accepted,
        skipped = summary.skipped,
        source = source.ticks_per_quarter(),
        "Parsed clipboard"
    );
    let scratch = scratch.rescaled(destination);
    Ok(ClipboardContent {
        notes: scratch.notes().export_all(),
        specials: scratch.specials().export_all(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fret::FretLane;
    use chart_model::{NoteFlag, SpecialKind, TickMap};

    fn res(ticks: u32) -> Resolution {
        Resolution::new(ticks).unwrap()
    }

    fn content() -> ClipboardContent {
        let mut notes: LaneData<NoteEvent> = vec![TickMap::new(); FretLane::COUNT];
        notes[FretLane::Green.index()].insert(0, NoteEvent::new(0));
        notes[FretLane::Red.index()].insert(200, NoteEvent::new(96));
        notes[FretLane::Red.index()].insert(230, NoteEvent::pinned(0, NoteFlag::Tap));
        let mut specials: LaneData<SpecialEvent> = vec![TickMap::new(); SpecialKind::COUNT];
        specials[SpecialKind::Starpower.index()].insert(200, SpecialEvent::new(SpecialKind::Starpower, 192));
        ClipboardContent { notes, specials }
    }

    #[test]
    fn text_has_header_and_lines() {
        let text = selection_to_string(res(192), &content());
        assert_eq!(
            text,
            "Resolution = 192\n0 = N 0 0\n200 = N 1 96\n200 = S 2 192\n230 = N 1 0\n230 = N 6 0\n"
        );
    }

    #[test]
    fn parse_same_resolution_reproduces_content() {
        let text = selection_to_string(res(192), &content());
        let parsed = parse_clipboard(&text, res(192)).unwrap();
        assert_eq!(parsed.event_count(), 4);
        assert_eq!(parsed.notes[FretLane::Red.index()][&200].sustain, 96);
        let tap = parsed.notes[FretLane::Red.index()][&230];
        assert_eq!((tap.flag, tap.is_default), (NoteFlag::Tap, false));
    }

    #[test]
    fn parse_rescales_to_destination() {
        let text = selection_to_string(res(192), &content());
        let parsed = parse_clipboard(&text, res(480)).unwrap();
        assert!(parsed.notes[FretLane::Red.index()].contains_key(&500));
        assert_eq!(parsed.notes[FretLane::Red.index()][&500].sustain, 240);
        assert_eq!(parsed.specials[SpecialKind::Starpower.index()][&500].length, 480);
    }

    #[test]
    fn header_is_optional_and_bad_lines_are_skipped() {
        let parsed = parse_clipboard("0 = N 2 0\nnot a line\n96 = N 3 0", res(192)).unwrap();
        assert_eq!(parsed.event_count(), 2);
        assert!(parse_clipboard("Resolution = 0\n0 = N 0 0", res(192)).is_err());
        assert!(parse_clipboard("Resolution = abc", res(192)).is_err());
        assert!(parse_clipboard("", res(192)).unwrap().is_empty());
    }
}
