use anyhow::Result;
use chart_model::{Resolution, Tick};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const SETTINGS_FILE: &str = "editor_settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    /// Clamp sustains against the next note in the same lane instead of any lane
    pub extended_sustains: bool,
    pub sustain_gap_enabled: bool,
    /// Gap as a note step (16 = a sixteenth note)
    pub sustain_gap_step: u32,
    /// Keep moved and pasted notes inside the audio length
    pub clamp_to_song_length: bool,
    pub verbose_logging: bool,
    pub log_dir: Option<String>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            extended_sustains: false,
            sustain_gap_enabled: false,
            sustain_gap_step: 16,
            clamp_to_song_length: true,
            verbose_logging: false,
            log_dir: None,
        }
    }
}

impl EditorSettings {
    /// Loads settings from the default settings file.
    /// Returns defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(SETTINGS_FILE)
    }

    /// Loads settings from a specified path.
    /// Returns defaults if the file doesn't exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(SETTINGS_FILE)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Minimum distance kept between a sustain's end and the next note.
    pub fn sustain_gap_ticks(&self, resolution: Resolution) -> Tick {
        if !self.sustain_gap_enabled || self.sustain_gap_step == 0 {
            return 0;
        }
        resolution.ticks_per_quarter() as Tick * 4 / self.sustain_gap_step as Tick
    }
}
