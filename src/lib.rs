pub mod config;
pub mod edit;
pub mod fret;
pub mod session;
pub mod track;
pub mod traits;
pub mod util;

pub use config::EditorSettings;
pub use edit::TrackEditor;
pub use fret::FretLane;
pub use session::{ChartSession, Difficulty, Instrument, TrackId};
pub use track::FiveFretTrack;

#[cfg(test)]
mod test_utils;
