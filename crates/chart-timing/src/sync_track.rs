use chart_model::line::format_chart_line;
use chart_model::{ChartError, IngestSummary, RawEvent, TempoEvent, Tick, TimeSignatureEvent};

use crate::tempo_map::TempoMap;

/// Largest `log2` denominator accepted from a `TS` line.
const MAX_DENOMINATOR_LOG2: u32 = 16;

impl TempoMap {
    /// Ingest the `(tick, raw)` lines of a sync track section.
    ///
    /// `B` and `TS` lines are inserted as they come. `A` lines are applied
    /// once every tempo is known, then timestamps are recalculated once.
    /// Lines that do not belong to a sync track, or fail to parse, are logged
    /// and skipped.
    pub fn add_events_from_lines<'a, I>(&mut self, lines: I) -> IngestSummary
    where
        I: IntoIterator<Item = (Tick, &'a str)>,
    {
        let mut summary = IngestSummary::default();
        let mut anchors = Vec::new();

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
                RawEvent::Tempo { bpm_thousandths } => {
                    match TempoEvent::new(bpm_thousandths as f64 / 1000.0) {
                        Ok(tempo) => {
                            self.bpm_store_mut().add(tick, tempo);
                            summary.accept();
                        }
                        Err(e) => summary.skip(tick, raw, e),
                    }
                }
                RawEvent::TimeSignature {
                    numerator,
                    denominator_log2,
                } => match time_signature(numerator, denominator_log2.unwrap_or(2)) {
                    Ok(signature) => {
                        self.time_signature_store_mut().add(tick, signature);
                        summary.accept();
                    }
                    Err(e) => summary.skip(tick, raw, e),
                },
                RawEvent::Anchor { micros } => anchors.push((tick, micros, raw)),
                _ => summary.skip(tick, raw, "not a sync track event"),
            }
        }

        self.recalculate(0);
        anchors.sort_by_key(|(tick, _, _)| *tick);
        for (tick, micros, raw) in anchors {
            if self.anchor_at(tick, micros as f64 / 1_000_000.0) {
                summary.accept();
            } else if self.bpm_store().contains(tick) && tick > 0 {
                summary.skip(tick, raw, "anchor unreachable from the previous tempo change");
            } else {
                summary.skip(tick, raw, "anchor without a tempo change at its tick");
            }
        }
        log::debug!(
            "Sync track ingested: {} accepted, {} skipped, {} tempo changes",
            summary.accepted,
            summary.skipped,
            self.bpm_store().len()
        );
        summary
    }

    /// Sync track lines in tick order. At a shared tick the time signature
    /// comes first, then the tempo, then its anchor.
    pub fn export_all_events(&self) -> Vec<String> {
        let mut lines: Vec<(Tick, u8, RawEvent)> = Vec::new();
        for (tick, signature) in self.time_signature_store().iter() {
            lines.push((
                tick,
                0,
                RawEvent::time_signature(signature.numerator, signature.denominator),
            ));
        }
        for (tick, tempo) in self.bpm_store().iter() {
            lines.push((tick, 1, RawEvent::tempo(tempo.bpm)));
            if tempo.anchored {
                lines.push((tick, 2, RawEvent::anchor(tempo.timestamp)));
            }
        }
        lines.sort_by_key(|(tick, order, _)| (*tick, *order));
        lines
            .iter()
            .map(|(tick, _, event)| format_chart_line(*tick, event))
            .collect()
    }
}

fn time_signature(numerator: u32, denominator_log2: u32) -> Result<TimeSignatureEvent, ChartError> {
    if denominator_log2 > MAX_DENOMINATOR_LOG2 {
        return Err(ChartError::InvalidTimeSignature {
            numerator,
            denominator: u32::MAX,
        });
    }
    TimeSignatureEvent::new(numerator, 1 << denominator_log2)
}
