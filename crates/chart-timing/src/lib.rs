// Tempo map: tick <-> seconds conversion, anchors, barline geometry, sync track IO

mod barline;
mod sync_track;
mod tempo_map;

pub use barline::BarlineType;
pub use tempo_map::{MAX_BPM, MIN_BPM, TempoMap};
