pub mod controller;
pub mod output;

pub use controller::{PlaybackController, PlayerState, Tick};
#[cfg(feature = "audio")]
pub use output::RodioOutput;
pub use output::{AudioOutput, NullOutput};

use std::time::Duration;

use crate::config::PlaybackConfig;

/// Knobs for the playback controller. The fade windows come straight from
/// the crossfade design: a 2.0s ramp in at track start, a 1.5s ramp out
/// across the end of the track.
#[derive(Debug, Clone)]
pub struct PlaybackSettings {
    pub volume: f32,
    pub fade_in: Duration,
    pub fade_out: Duration,
    pub tick: Duration,
    /// How long to wait before skipping past a track that failed to load.
    pub skip_delay: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            fade_in: Duration::from_millis(2000),
            fade_out: Duration::from_millis(1500),
            tick: Duration::from_millis(100),
            skip_delay: Duration::from_millis(1000),
        }
    }
}

impl From<&PlaybackConfig> for PlaybackSettings {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            volume: config.volume.clamp(0.0, 1.0),
            fade_in: Duration::from_secs_f32(config.fade_in_secs.max(0.0)),
            fade_out: Duration::from_secs_f32(config.fade_out_secs.max(0.0)),
            tick: Duration::from_millis(config.tick_ms.max(10)),
            skip_delay: Duration::from_millis(config.skip_delay_ms),
        }
    }
}
