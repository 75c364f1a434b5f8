use std::fmt;

use chart_model::LaneOrdering;

/// `N 5 0`: pins the note(s) at a tick to the inverse of their computed flag.
pub const FORCED_MODIFIER: u32 = 5;
/// `N 6 0`: pins the note(s) at a tick to tap.
pub const TAP_MODIFIER: u32 = 6;

/// Five-fret lane slots. Open is stored last but is the lowest pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FretLane {
    Green,
    Red,
    Yellow,
    Blue,
    Orange,
    Open,
}

impl FretLane {
    pub const COUNT: usize = 6;

    pub fn all() -> [FretLane; Self::COUNT] {
        [
            FretLane::Green,
            FretLane::Red,
            FretLane::Yellow,
            FretLane::Blue,
            FretLane::Orange,
            FretLane::Open,
        ]
    }

    /// Lane slot in the note lane group.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::all().get(index).copied()
    }

    /// Lane for an `N <fret>` value; modifiers and unknown values give `None`.
    pub fn from_chart_fret(fret: u32) -> Option<Self> {
        match fret {
            0 => Some(FretLane::Green),
            1 => Some(FretLane::Red),
            2 => Some(FretLane::Yellow),
            3 => Some(FretLane::Blue),
            4 => Some(FretLane::Orange),
            7 => Some(FretLane::Open),
            _ => None,
        }
    }

    pub fn chart_fret(self) -> u32 {
        match self {
            FretLane::Open => 7,
            fret => fret as u32,
        }
    }

    pub fn is_open(self) -> bool {
        self == FretLane::Open
    }

    /// Slots from lowest to highest pitch: open first, then green through orange.
    pub fn pitch_ordering() -> LaneOrdering {
        LaneOrdering::new(vec![
            FretLane::Open.index(),
            FretLane::Green.index(),
            FretLane::Red.index(),
            FretLane::Yellow.index(),
            FretLane::Blue.index(),
            FretLane::Orange.index(),
        ])
    }
}

impl fmt::Display for FretLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FretLane::Green => "green",
            FretLane::Red => "red",
            FretLane::Yellow => "yellow",
            FretLane::Blue => "blue",
            FretLane::Orange => "orange",
            FretLane::Open => "open",
        };
        f.write_str(name)
    }
}
