use std::cell::Cell;

/// Position and length reported by the audio side.
/// Implementations: the editor's audio engine (production), MockPlaybackClock (testing).
pub trait PlaybackClock {
    /// Current playback position in seconds.
    fn current_playback_seconds(&self) -> f64;

    /// Length of the loaded audio, if any is loaded.
    fn song_length_seconds(&self) -> Option<f64>;
}

/// Mock clock for deterministic testing.
pub struct MockPlaybackClock {
    position: Cell<f64>,
    length: Cell<Option<f64>>,
}

impl MockPlaybackClock {
    pub fn new(length: Option<f64>) -> Self {
        Self {
            position: Cell::new(0.0),
            length: Cell::new(length),
        }
    }

    pub fn seek(&self, seconds: f64) {
        self.position.set(seconds);
    }

    pub fn advance(&self, delta_seconds: f64) {
        self.position.set(self.position.get() + delta_seconds);
    }

    pub fn set_song_length(&self, length: Option<f64>) {
        self.length.set(length);
    }
}

impl Default for MockPlaybackClock {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PlaybackClock for MockPlaybackClock {
    fn current_playback_seconds(&self) -> f64 {
        self.position.get()
    }

    fn song_length_seconds(&self) -> Option<f64> {
        self.length.get()
    }
}
