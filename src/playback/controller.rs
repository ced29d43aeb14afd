// Playback controller - wraps the single audio channel and owns all of its
// bookkeeping: load/start/stop, seek, the wall-clock position reference and
// the fade envelope. Driven by a 100ms polling tick from the app loop.
//
// Nothing in here is fatal. A track that fails to load is logged and skipped
// after a short delay; every other failure degrades to a state change.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::output::AudioOutput;
use super::PlaybackSettings;
use crate::catalog::Track;
use crate::media::{AssetKind, MediaResolver};

/// What a clock tick observed. `EndOfTrack` and `SkipFailedTrack` both mean
/// the caller should advance the playlist window and hand the new current
/// track back via [`PlaybackController::track_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Idle,
    Playing,
    EndOfTrack,
    SkipFailedTrack,
}

/// Derived playback state, reset on every load and never persisted.
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    /// Sound is actually coming out of the channel.
    pub is_playing: bool,
    pub is_loading: bool,
    /// Clamped to `[0, duration]`.
    pub position: Duration,
    /// Unknown when the container does not report one; end-of-track
    /// detection is disabled until a duration is known.
    pub duration: Option<Duration>,
}

pub struct PlaybackController<O: AudioOutput> {
    output: O,
    resolver: MediaResolver,
    settings: PlaybackSettings,
    state: PlayerState,
    /// Resolved location of the loaded asset, None after a failed load.
    loaded: Option<String>,
    /// The user wants sound. Survives auto-advance and failed loads so the
    /// next track resumes in the same mode.
    intend_playing: bool,
    /// Wall-clock reference while audible: now - started_at == position.
    started_at: Option<Instant>,
    /// Fade-in anchor, set each time output starts.
    play_started: Option<Instant>,
    /// When to give up on a track that failed to load and skip past it.
    skip_deadline: Option<Instant>,
    gain: f32,
}

impl<O: AudioOutput> PlaybackController<O> {
    pub fn new(output: O, resolver: MediaResolver, settings: PlaybackSettings) -> Self {
        Self {
            output,
            resolver,
            settings,
            state: PlayerState::default(),
            loaded: None,
            intend_playing: false,
            started_at: None,
            play_started: None,
            skip_deadline: None,
            gain: 0.0,
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn intends_playing(&self) -> bool {
        self.intend_playing
    }

    /// Gain currently applied to the output channel. Exposed for the fade
    /// envelope tests and the volume readout.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Load a track without starting output. Failure is recoverable: it is
    /// logged and a skip is scheduled so playback moves on by itself.
    pub fn load(&mut self, track: &Track) {
        self.state.is_loading = true;
        self.stop_output();
        self.state.position = Duration::ZERO;

        let location = self.resolver.resolve(AssetKind::Audio, &track.filename);
        match self.output.load(&location) {
            Ok(duration) => {
                info!("Loaded '{}' ({:?})", track.title, duration);
                self.loaded = Some(location);
                self.state.duration = duration;
                self.skip_deadline = None;
            }
            Err(err) => {
                warn!("Failed to load '{}': {err:#}", track.title);
                self.loaded = None;
                self.state.duration = None;
                self.skip_deadline = Some(Instant::now() + self.settings.skip_delay);
            }
        }
        self.state.is_loading = false;
    }

    /// Start output at the stored position with a fade-in ramp. A start
    /// failure leaves the controller paused rather than erroring out.
    pub fn play(&mut self) {
        self.intend_playing = true;
        if self.loaded.is_none() {
            debug!("Play requested with nothing loaded");
            return;
        }

        match self.output.start_at(self.state.position) {
            Ok(()) => {
                let now = Instant::now();
                self.started_at = Some(now - self.state.position);
                self.play_started = Some(now);
                self.state.is_playing = true;
                self.apply_gain(now);
            }
            Err(err) => {
                warn!("Failed to start playback: {err:#}");
                self.state.is_playing = false;
            }
        }
    }

    /// Stop output but keep the position; resuming continues from here.
    pub fn pause(&mut self) {
        self.intend_playing = false;
        if self.state.is_playing {
            self.state.position = self.elapsed(Instant::now());
        }
        self.stop_output();
    }

    pub fn toggle(&mut self) {
        if self.intend_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Seek to a target, clamped into `[0, duration]`. While audible the
    /// output restarts at the new offset; while paused only the bookkeeping
    /// moves.
    pub fn seek(&mut self, target: Duration) {
        let clamped = match self.state.duration {
            Some(duration) => target.min(duration),
            None => target,
        };
        self.state.position = clamped;

        if self.state.is_playing {
            match self.output.start_at(clamped) {
                Ok(()) => {
                    self.started_at = Some(Instant::now() - clamped);
                    self.apply_gain(Instant::now());
                }
                Err(err) => {
                    warn!("Failed to restart at {:?}: {err:#}", clamped);
                    self.state.is_playing = false;
                    self.started_at = None;
                }
            }
        }
    }

    pub fn seek_by(&mut self, delta_secs: i64) {
        let current = self.current_position(Instant::now());
        let target = if delta_secs.is_negative() {
            current.saturating_sub(Duration::from_secs(delta_secs.unsigned_abs()))
        } else {
            current + Duration::from_secs(delta_secs.unsigned_abs())
        };
        self.seek(target);
    }

    /// The 100ms polling clock. Updates position and the fade envelope, and
    /// reports when the track ended or a failed track should be skipped.
    pub fn tick(&mut self) -> Tick {
        let now = Instant::now();

        if let Some(deadline) = self.skip_deadline {
            if now >= deadline {
                self.skip_deadline = None;
                return Tick::SkipFailedTrack;
            }
        }

        if !self.state.is_playing {
            return Tick::Idle;
        }

        let elapsed = self.elapsed(now);
        if let Some(duration) = self.state.duration {
            if elapsed >= duration {
                self.state.position = duration;
                self.stop_output();
                return Tick::EndOfTrack;
            }
        }

        self.state.position = elapsed;
        self.apply_gain(now);
        Tick::Playing
    }

    /// React to the playlist window's current track changing. While the user
    /// wants sound the new track starts immediately; while paused it is only
    /// loaded so the metadata refreshes.
    pub fn track_changed(&mut self, track: &Track) {
        self.load(track);
        if self.intend_playing && self.loaded.is_some() {
            self.play();
        }
    }

    fn elapsed(&self, now: Instant) -> Duration {
        let Some(started) = self.started_at else {
            return self.state.position;
        };
        let elapsed = now.saturating_duration_since(started);
        match self.state.duration {
            Some(duration) => elapsed.min(duration),
            None => elapsed,
        }
    }

    fn current_position(&self, now: Instant) -> Duration {
        if self.state.is_playing {
            self.elapsed(now)
        } else {
            self.state.position
        }
    }

    /// Linear fade envelope: ramp up over `fade_in` from the moment output
    /// started, ramp down to silence across the last `fade_out` of the
    /// track. Scrubbing back out of the tail restores full gain because the
    /// envelope is recomputed from the position every tick.
    fn apply_gain(&mut self, now: Instant) {
        let fade_in = match self.play_started {
            Some(started) if !self.settings.fade_in.is_zero() => {
                let since = now.saturating_duration_since(started);
                (since.as_secs_f32() / self.settings.fade_in.as_secs_f32()).min(1.0)
            }
            _ => 1.0,
        };

        let fade_out = match self.state.duration {
            Some(duration) if !self.settings.fade_out.is_zero() => {
                let remaining = duration.saturating_sub(self.state.position);
                if remaining <= self.settings.fade_out {
                    remaining.as_secs_f32() / self.settings.fade_out.as_secs_f32()
                } else {
                    1.0
                }
            }
            _ => 1.0,
        };

        self.gain = (self.settings.volume * fade_in.min(fade_out)).clamp(0.0, 1.0);
        self.output.set_gain(self.gain);
    }

    fn stop_output(&mut self) {
        self.output.stop();
        self.state.is_playing = false;
        self.started_at = None;
        self.play_started = None;
    }
}
