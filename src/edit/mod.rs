pub mod clipboard;
mod editor;
pub mod transform;
pub mod validator;

pub use editor::TrackEditor;
