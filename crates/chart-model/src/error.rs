use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ChartError {
    #[error("Resolution must be greater than zero")]
    ZeroResolution,

    #[error("Negative tick: {0}")]
    NegativeTick(i64),

    #[error("Malformed chart line: {0}")]
    MalformedLine(String),

    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    #[error("Invalid {field} value: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid time signature: {numerator}/{denominator}")]
    InvalidTimeSignature { numerator: u32, denominator: u32 },

    #[error("Invalid BPM: {0}")]
    InvalidBpm(f64),

    #[error("Unknown fret number: {0}")]
    UnknownFret(u32),

    #[error("Unknown special phrase type: {0}")]
    UnknownSpecial(u32),
}
