//! Chart line grammar.
//!
//! A chart section body is a list of `<tick> = <raw>` lines; the raw value is
//! one of:
//!
//! | raw | meaning |
//! |---|---|
//! | `N <fret> <sustain>` | note or note modifier |
//! | `S <kind> <length>` | special phrase |
//! | `E <text>` / `E "<text>"` | text event |
//! | `B <bpm * 1000>` | tempo change |
//! | `TS <numerator> [<log2 denominator>]` | time signature |
//! | `A <microseconds>` | tempo anchor |

use std::fmt;

use crate::error::ChartError;
use crate::tick::Tick;

/// Outcome of feeding `(tick, raw)` lines into a track or tempo map.
/// Malformed lines are logged and counted, never fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub accepted: usize,
    pub skipped: usize,
}

impl IngestSummary {
    pub fn accept(&mut self) {
        self.accepted += 1;
    }

    pub fn skip(&mut self, tick: Tick, raw: &str, reason: impl fmt::Display) {
        log::warn!("Skipping chart line `{tick} = {raw}`: {reason}");
        self.skipped += 1;
    }
}

/// One parsed raw event value, before it is interpreted against a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    Note { fret: u32, sustain: Tick },
    Special { code: u32, length: Tick },
    Text { text: String, quoted: bool },
    Tempo { bpm_thousandths: u64 },
    TimeSignature { numerator: u32, denominator_log2: Option<u32> },
    Anchor { micros: u64 },
}

fn parse_field<N: std::str::FromStr>(field: &'static str, value: Option<&str>) -> Result<N, ChartError> {
    let value = value.ok_or_else(|| ChartError::InvalidNumber {
        field,
        value: String::new(),
    })?;
    value.parse().map_err(|_| ChartError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_length(field: &'static str, value: Option<&str>) -> Result<Tick, ChartError> {
    let length: Tick = parse_field(field, value)?;
    if length < 0 {
        return Err(ChartError::InvalidNumber {
            field,
            value: length.to_string(),
        });
    }
    Ok(length)
}

impl RawEvent {
    pub fn parse(raw: &str) -> Result<Self, ChartError> {
        let raw = raw.trim();
        let (kind, rest) = raw.split_once(char::is_whitespace).unwrap_or((raw, ""));
        let rest = rest.trim();

        if kind == "E" {
            if rest.is_empty() {
                return Err(ChartError::MalformedLine(raw.to_string()));
            }
            let unquoted = rest
                .strip_prefix('"')
                .and_then(|r| r.strip_suffix('"'));
            return Ok(match unquoted {
                Some(text) => RawEvent::Text {
                    text: text.to_string(),
                    quoted: true,
                },
                None => RawEvent::Text {
                    text: rest.to_string(),
                    quoted: false,
                },
            });
        }

        let mut fields = rest.split_whitespace();
        let event = match kind {
            "N" => RawEvent::Note {
                fret: parse_field("fret", fields.next())?,
                sustain: parse_length("sustain", fields.next())?,
            },
            "S" => RawEvent::Special {
                code: parse_field("special type", fields.next())?,
                length: parse_length("special length", fields.next())?,
            },
            "B" => RawEvent::Tempo {
                bpm_thousandths: parse_field("bpm", fields.next())?,
            },
            "TS" => {
                let numerator = parse_field("numerator", fields.next())?;
                let denominator_log2 = match fields.next() {
                    Some(value) => Some(parse_field("denominator", Some(value))?),
                    None => None,
                };
                RawEvent::TimeSignature {
                    numerator,
                    denominator_log2,
                }
            }
            "A" => RawEvent::Anchor {
                micros: parse_field("anchor", fields.next())?,
            },
            other => return Err(ChartError::UnknownEventType(other.to_string())),
        };

        if fields.next().is_some() {
            return Err(ChartError::MalformedLine(raw.to_string()));
        }
        Ok(event)
    }

    /// Tempo line for a BPM value, rounded to the nearest thousandth.
    pub fn tempo(bpm: f64) -> Self {
        RawEvent::Tempo {
            bpm_thousandths: (bpm * 1000.0).round().max(0.0) as u64,
        }
    }

    /// Time signature line; the denominator field is omitted for quarter-note signatures.
    pub fn time_signature(numerator: u32, denominator: u32) -> Self {
        let denominator_log2 = (denominator != 4).then(|| denominator.trailing_zeros());
        RawEvent::TimeSignature {
            numerator,
            denominator_log2,
        }
    }

    /// Anchor line for a timestamp in seconds.
    pub fn anchor(seconds: f64) -> Self {
        RawEvent::Anchor {
            micros: (seconds * 1_000_000.0).round().max(0.0) as u64,
        }
    }
}

impl fmt::Display for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawEvent::Note { fret, sustain } => write!(f, "N {fret} {sustain}"),
            RawEvent::Special { code, length } => write!(f, "S {code} {length}"),
            RawEvent::Text { text, quoted: true } => write!(f, "E \"{text}\""),
            RawEvent::Text { text, quoted: false } => write!(f, "E {text}"),
            RawEvent::Tempo { bpm_thousandths } => write!(f, "B {bpm_thousandths}"),
            RawEvent::TimeSignature {
                numerator,
                denominator_log2: Some(log2),
            } => write!(f, "TS {numerator} {log2}"),
            RawEvent::TimeSignature {
                numerator,
                denominator_log2: None,
            } => write!(f, "TS {numerator}"),
            RawEvent::Anchor { micros } => write!(f, "A {micros}"),
        }
    }
}

/// Split a `<tick> = <raw>` line into its tick and raw value.
pub fn split_chart_line(line: &str) -> Result<(Tick, &str), ChartError> {
    let (tick, raw) = line
        .split_once('=')
        .ok_or_else(|| ChartError::MalformedLine(line.to_string()))?;
    let tick: Tick = parse_field("tick", Some(tick.trim()))?;
    if tick < 0 {
        return Err(ChartError::NegativeTick(tick));
    }
    Ok((tick, raw.trim()))
}

/// Parse a full `<tick> = <raw>` line.
pub fn parse_chart_line(line: &str) -> Result<(Tick, RawEvent), ChartError> {
    let (tick, raw) = split_chart_line(line)?;
    Ok((tick, RawEvent::parse(raw)?))
}

pub fn format_chart_line(tick: Tick, event: &RawEvent) -> String {
    format!("{tick} = {event}")
}
