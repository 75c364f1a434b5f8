use crate::error::ChartError;
use crate::tick::{Resolution, Tick};

/// Tempo assumed at tick 0 when a chart supplies none.
pub const DEFAULT_BPM: f64 = 120.0;

/// How a five-fret note is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NoteFlag {
    #[default]
    Strum,
    Hopo,
    Tap,
}

impl NoteFlag {
    /// The flag a "forced" toggle produces. Tap has no inverse and stays Tap.
    pub fn inverted(self) -> Self {
        match self {
            NoteFlag::Strum => NoteFlag::Hopo,
            NoteFlag::Hopo => NoteFlag::Strum,
            NoteFlag::Tap => NoteFlag::Tap,
        }
    }
}

/// A note on one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteEvent {
    /// Held length in ticks (0 = no sustain)
    pub sustain: Tick,
    pub flag: NoteFlag,
    /// True when `flag` was derived by the classifier rather than pinned by the user
    pub is_default: bool,
    /// Pinned to the inverse of the classifier's flag, whatever that becomes
    pub forced: bool,
}

impl NoteEvent {
    /// A note whose flag will be derived by the classifier.
    pub fn new(sustain: Tick) -> Self {
        Self {
            sustain: sustain.max(0),
            flag: NoteFlag::Strum,
            is_default: true,
            forced: false,
        }
    }

    /// A note with a user-pinned flag.
    pub fn pinned(sustain: Tick, flag: NoteFlag) -> Self {
        Self {
            sustain: sustain.max(0),
            flag,
            is_default: false,
            forced: false,
        }
    }

    /// A forced note. Its flag is set once the classifier has run.
    pub fn forced(sustain: Tick) -> Self {
        Self {
            forced: true,
            ..Self::pinned(sustain, NoteFlag::Strum)
        }
    }

    /// Apply the classifier's `natural` flag. Fixed pins keep their flag.
    pub fn resolve(&mut self, natural: NoteFlag) {
        if self.is_default {
            self.flag = natural;
        } else if self.forced {
            self.flag = natural.inverted();
        }
    }

    /// Drop any pin and take `natural`.
    pub fn release(&mut self, natural: NoteFlag) {
        self.is_default = true;
        self.forced = false;
        self.flag = natural;
    }
}

impl Default for NoteEvent {
    fn default() -> Self {
        Self::new(0)
    }
}

/// A BPM change. `timestamp` is derived by the tempo map unless `anchored`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEvent {
    pub bpm: f64,
    /// Seconds from song start
    pub timestamp: f64,
    /// Timestamp is pinned; the preceding BPM is solved to honour it
    pub anchored: bool,
}

impl TempoEvent {
    pub fn new(bpm: f64) -> Result<Self, ChartError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(ChartError::InvalidBpm(bpm));
        }
        Ok(Self {
            bpm,
            timestamp: 0.0,
            anchored: false,
        })
    }
}

impl Default for TempoEvent {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            timestamp: 0.0,
            anchored: false,
        }
    }
}

/// Time signature change. Denominator is the real note value (4 = quarter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSignatureEvent {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignatureEvent {
    pub fn new(numerator: u32, denominator: u32) -> Result<Self, ChartError> {
        if numerator == 0 || !denominator.is_power_of_two() {
            return Err(ChartError::InvalidTimeSignature {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Ticks per beat (one denominator note), at least one tick.
    pub fn beat_ticks(&self, resolution: Resolution) -> Tick {
        let ticks = resolution.ticks_per_quarter() as Tick * 4 / self.denominator as Tick;
        ticks.max(1)
    }

    /// Ticks per bar.
    pub fn bar_ticks(&self, resolution: Resolution) -> Tick {
        self.beat_ticks(resolution) * self.numerator as Tick
    }
}

impl Default for TimeSignatureEvent {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

/// Phrase types that span a tick range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecialKind {
    Starpower,
    DrumFill,
}

impl SpecialKind {
    pub const COUNT: usize = 2;

    pub fn all() -> &'static [SpecialKind] {
        &[SpecialKind::Starpower, SpecialKind::DrumFill]
    }

    /// Lane slot used when specials are stored in a lane group.
    pub fn index(self) -> usize {
        match self {
            SpecialKind::Starpower => 0,
            SpecialKind::DrumFill => 1,
        }
    }

    /// Numeric code used by the `S` chart line.
    pub fn code(self) -> u32 {
        match self {
            SpecialKind::Starpower => 2,
            SpecialKind::DrumFill => 64,
        }
    }

    pub fn from_code(code: u32) -> Result<Self, ChartError> {
        match code {
            2 => Ok(SpecialKind::Starpower),
            64 => Ok(SpecialKind::DrumFill),
            other => Err(ChartError::UnknownSpecial(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecialEvent {
    pub kind: SpecialKind,
    pub length: Tick,
}

impl SpecialEvent {
    pub fn new(kind: SpecialKind, length: Tick) -> Self {
        Self {
            kind,
            length: length.max(0),
        }
    }
}

/// Text marker scoped to one track.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocalEventKind {
    Solo,
    SoloEnd,
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalEvent {
    pub kind: LocalEventKind,
}

impl LocalEvent {
    pub fn from_text(text: &str) -> Self {
        let kind = match text {
            "solo" => LocalEventKind::Solo,
            "soloend" => LocalEventKind::SoloEnd,
            other => LocalEventKind::Text(other.to_string()),
        };
        Self { kind }
    }

    pub fn text(&self) -> &str {
        match &self.kind {
            LocalEventKind::Solo => "solo",
            LocalEventKind::SoloEnd => "soloend",
            LocalEventKind::Text(text) => text,
        }
    }
}

/// Chart-wide text marker from the events section.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GlobalEvent {
    Section(String),
    Lyric(String),
    Text(String),
}

impl GlobalEvent {
    /// Build from the unquoted event text.
    pub fn from_text(text: &str) -> Self {
        if let Some(name) = text.strip_prefix("section ") {
            GlobalEvent::Section(name.to_string())
        } else if let Some(lyric) = text.strip_prefix("lyric ") {
            GlobalEvent::Lyric(lyric.to_string())
        } else {
            GlobalEvent::Text(text.to_string())
        }
    }

    /// Unquoted event text.
    pub fn text(&self) -> String {
        match self {
            GlobalEvent::Section(name) => format!("section {name}"),
            GlobalEvent::Lyric(lyric) => format!("lyric {lyric}"),
            GlobalEvent::Text(text) => text.clone(),
        }
    }
}
