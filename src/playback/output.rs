// Audio output seam. Exactly one output channel exists and the playback
// controller owns it exclusively; nothing else may start or stop sound.

use anyhow::Result;
use std::time::Duration;

/// One exclusive audio channel: load an asset, start it at an offset, stop
/// it, and shape its gain. Position and end-of-track bookkeeping live in the
/// controller, not here.
pub trait AudioOutput {
    /// Stop anything audible, decode the asset at `location` and report its
    /// duration when the container knows it.
    fn load(&mut self, location: &str) -> Result<Option<Duration>>;

    /// Begin output `offset` into the loaded asset.
    fn start_at(&mut self, offset: Duration) -> Result<()>;

    fn stop(&mut self);

    /// Linear gain, 0.0 silence to 1.0 full.
    fn set_gain(&mut self, gain: f32);
}

#[cfg(feature = "audio")]
pub use rodio_output::RodioOutput;

#[cfg(feature = "audio")]
mod rodio_output {
    use super::AudioOutput;
    use anyhow::{anyhow, Context, Result};
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use std::fs::File;
    use std::io::BufReader;
    use std::time::Duration;
    use tracing::{debug, warn};

    pub struct RodioOutput {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sink: Option<Sink>,
        loaded: Option<String>,
        gain: f32,
    }

    impl RodioOutput {
        pub fn new() -> Result<Self> {
            let (stream, handle) =
                OutputStream::try_default().context("failed to open an audio output device")?;
            Ok(Self {
                _stream: stream,
                handle,
                sink: None,
                loaded: None,
                gain: 1.0,
            })
        }

        fn open_decoder(location: &str) -> Result<Decoder<BufReader<File>>> {
            if location.starts_with("http://") || location.starts_with("https://") {
                return Err(anyhow!(
                    "remote audio is not supported, configure a local audio base for {location}"
                ));
            }
            let file =
                File::open(location).with_context(|| format!("failed to open {location}"))?;
            Decoder::new(BufReader::new(file))
                .with_context(|| format!("failed to decode {location}"))
        }
    }

    impl AudioOutput for RodioOutput {
        fn load(&mut self, location: &str) -> Result<Option<Duration>> {
            self.stop();
            let duration = Self::open_decoder(location)?.total_duration();
            debug!("Decoded {} (duration {:?})", location, duration);
            self.loaded = Some(location.to_string());
            Ok(duration)
        }

        fn start_at(&mut self, offset: Duration) -> Result<()> {
            let location = self
                .loaded
                .clone()
                .ok_or_else(|| anyhow!("no asset loaded"))?;

            self.stop();
            let sink = Sink::try_new(&self.handle).context("failed to create audio sink")?;
            sink.set_volume(self.gain);
            sink.append(Self::open_decoder(&location)?);

            if !offset.is_zero() {
                // Some formats cannot seek; play from the start rather than
                // refusing to play at all.
                if let Err(err) = sink.try_seek(offset) {
                    warn!("Seek to {:?} failed for {}: {:?}", offset, location, err);
                }
            }

            self.sink = Some(sink);
            Ok(())
        }

        fn stop(&mut self) {
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
        }

        fn set_gain(&mut self, gain: f32) {
            self.gain = gain.clamp(0.0, 1.0);
            if let Some(sink) = &self.sink {
                sink.set_volume(self.gain);
            }
        }
    }
}

/// Silent engine for `--mute` runs, headless builds and tests. Reports the
/// injected duration when one is given; otherwise a load only succeeds when
/// the file exists, with the duration unknown.
#[derive(Debug, Default)]
pub struct NullOutput {
    duration: Option<Duration>,
    loaded: Option<String>,
    gain: f32,
}

impl NullOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(duration: Duration) -> Self {
        Self {
            duration: Some(duration),
            ..Self::default()
        }
    }
}

impl AudioOutput for NullOutput {
    fn load(&mut self, location: &str) -> Result<Option<Duration>> {
        self.loaded = None;
        if self.duration.is_none() && !std::path::Path::new(location).is_file() {
            anyhow::bail!("no such asset: {location}");
        }
        self.loaded = Some(location.to_string());
        Ok(self.duration)
    }

    fn start_at(&mut self, _offset: Duration) -> Result<()> {
        if self.loaded.is_none() {
            anyhow::bail!("no asset loaded");
        }
        Ok(())
    }

    fn stop(&mut self) {}

    fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
    }
}
