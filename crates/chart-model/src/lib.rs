// Chart event model: tick-keyed stores, lane groups, selections, line grammar

mod error;
mod event;
mod lane_group;
pub mod line;
mod selection;
mod store;
mod tick;

pub use error::ChartError;
pub use event::{
    DEFAULT_BPM, GlobalEvent, LocalEvent, LocalEventKind, NoteEvent, NoteFlag, SpecialEvent,
    SpecialKind, TempoEvent, TimeSignatureEvent,
};
pub use lane_group::{LaneData, LaneGroup, LaneOrdering, NormalizedSelection};
pub use line::{IngestSummary, RawEvent};
pub use selection::SelectionSet;
pub use store::{TickEventStore, next_in, previous_in};
pub use tick::{Resolution, Tick, TickMap, TickSpan};
