use std::fmt;

/// Ordered hardest first, the order track sections are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Difficulty {
    Expert,
    Hard,
    Medium,
    Easy,
}

impl Difficulty {
    pub fn all() -> [Difficulty; 4] {
        [
            Difficulty::Expert,
            Difficulty::Hard,
            Difficulty::Medium,
            Difficulty::Easy,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Expert => "Expert",
            Difficulty::Hard => "Hard",
            Difficulty::Medium => "Medium",
            Difficulty::Easy => "Easy",
        }
    }
}

/// Five-fret instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Instrument {
    Guitar,
    GuitarCoop,
    Bass,
    Rhythm,
    Keys,
}

impl Instrument {
    pub fn all() -> [Instrument; 5] {
        [
            Instrument::Guitar,
            Instrument::GuitarCoop,
            Instrument::Bass,
            Instrument::Rhythm,
            Instrument::Keys,
        ]
    }

    /// Section name suffix after the difficulty.
    pub fn section_suffix(self) -> &'static str {
        match self {
            Instrument::Guitar => "Single",
            Instrument::GuitarCoop => "DoubleGuitar",
            Instrument::Bass => "DoubleBass",
            Instrument::Rhythm => "DoubleRhythm",
            Instrument::Keys => "Keyboard",
        }
    }
}

/// One chart section: an instrument at a difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId {
    pub instrument: Instrument,
    pub difficulty: Difficulty,
}

impl TrackId {
    pub fn new(instrument: Instrument, difficulty: Difficulty) -> Self {
        Self {
            instrument,
            difficulty,
        }
    }

    /// Parse a section name such as `ExpertSingle` or `HardDoubleBass`.
    pub fn from_section_name(name: &str) -> Option<Self> {
        let difficulty = Difficulty::all()
            .into_iter()
            .find(|d| name.starts_with(d.name()))?;
        let suffix = &name[difficulty.name().len()..];
        let instrument = Instrument::all()
            .into_iter()
            .find(|i| i.section_suffix() == suffix)?;
        Some(Self::new(instrument, difficulty))
    }

    pub fn section_name(&self) -> String {
        format!("{}{}", self.difficulty.name(), self.instrument.section_suffix())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new(Instrument::Guitar, Difficulty::Expert)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.section_name())
    }
}
