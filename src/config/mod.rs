mod editor_settings;

pub use editor_settings::EditorSettings;
