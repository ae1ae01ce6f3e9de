//! Audio output and the playable source behind the transport.
//!
//! The engine owns rodio's output stream. Each opened file becomes a
//! [`PlaybackSource`]: the event-loop side of a fully decoded file that
//! implements [`AudioSource`]. The render side is a [`StreamSource`] appended
//! to the source's own sink. The two halves share only atomics and the
//! immutable sample buffer, so the output callback never blocks.

use rodio::{OutputStream, OutputStreamBuilder, Sink, Source};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
    mpsc,
};
use std::time::Duration;

use super::decoder::{self, DecodedAudio};
use tapedeck::transport::{AudioSource, SourceEvent};

// Type alias for the audio engine creation result
type AudioEngineResult = Result<(AudioEngine, mpsc::Receiver<SourceEvent>), Box<dyn Error>>;

pub struct AudioEngine {
    stream: OutputStream,
    events_tx: mpsc::Sender<SourceEvent>,
}

impl AudioEngine {
    /// Open the default output device. The returned receiver is the single
    /// subscriber for status notifications from every source this engine
    /// opens.
    pub fn new() -> AudioEngineResult {
        let stream = OutputStreamBuilder::open_default_stream()?;
        let (events_tx, events_rx) = mpsc::channel();

        Ok((Self { stream, events_tx }, events_rx))
    }

    pub fn open(&self, path: &Path) -> Result<PlaybackSource, Box<dyn Error>> {
        let audio = Arc::new(decoder::decode_file(path)?);
        let shared = Arc::new(Shared::new(audio, self.events_tx.clone()));

        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(StreamSource::new(shared.clone()));

        Ok(PlaybackSource {
            shared,
            sink,
            path: path.to_path_buf(),
        })
    }
}

/// State shared between the event loop and the output callback.
struct Shared {
    audio: Arc<DecodedAudio>,
    /// Next frame to render.
    position: AtomicUsize,
    playing: AtomicBool,
    looping: AtomicBool,
    events_tx: mpsc::Sender<SourceEvent>,
}

impl Shared {
    fn new(audio: Arc<DecodedAudio>, events_tx: mpsc::Sender<SourceEvent>) -> Self {
        Self {
            audio,
            position: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            looping: AtomicBool::new(false),
            events_tx,
        }
    }

    fn frames(&self) -> usize {
        self.audio.frames()
    }

    fn notify(&self) {
        // The receiver only disappears on shutdown
        let _ = self.events_tx.send(SourceEvent::StatusChanged);
    }

    fn start(&self) {
        self.playing.store(true, Ordering::Release);
        self.notify();
    }

    fn stop(&self) {
        self.playing.store(false, Ordering::Release);
        self.notify();
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    fn set_looping(&self, looping: bool) {
        self.looping.store(looping, Ordering::Release);
    }

    fn set_position(&self, position: Duration) {
        let frame = (position.as_secs_f64() * self.audio.sample_rate as f64).round() as usize;
        self.position.store(frame.min(self.frames()), Ordering::Release);
    }

    fn current_position(&self) -> Duration {
        let frame = self.position.load(Ordering::Acquire).min(self.frames());
        Duration::from_secs_f64(frame as f64 / self.audio.sample_rate as f64)
    }

    /// Claim the next frame for rendering and return the index of its first
    /// sample. At the end of the track this wraps when looping, otherwise it
    /// clears the playing flag, notifies, and returns `None`.
    fn next_frame(&self) -> Option<usize> {
        let frames = self.frames();
        let mut frame = self.position.fetch_add(1, Ordering::AcqRel);

        if frame >= frames {
            if self.looping.load(Ordering::Acquire) && frames > 0 {
                self.position.store(1, Ordering::Release);
                frame = 0;
            } else {
                self.position.store(frames, Ordering::Release);
                if self.playing.swap(false, Ordering::AcqRel) {
                    log::debug!("End of track reached");
                    self.notify();
                }
                return None;
            }
        }

        Some(frame * self.audio.channels as usize)
    }
}

/// Render-side view of a loaded file, pulled by the output mixer.
///
/// The stream never ends: while the source is not playing it yields
/// silence. Play/silence is decided per frame so channels stay aligned.
struct StreamSource {
    shared: Arc<Shared>,
    channel: usize,
    frame_start: Option<usize>,
}

impl StreamSource {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            channel: 0,
            frame_start: None,
        }
    }
}

impl Iterator for StreamSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let channels = self.shared.audio.channels.max(1) as usize;

        if self.channel == 0 {
            self.frame_start = if self.shared.is_playing() {
                self.shared.next_frame()
            } else {
                None
            };
        }

        let sample = self
            .frame_start
            .and_then(|start| self.shared.audio.samples.get(start + self.channel))
            .copied()
            .unwrap_or(0.0);

        self.channel = (self.channel + 1) % channels;
        Some(sample)
    }
}

impl Source for StreamSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> rodio::ChannelCount {
        self.shared.audio.channels
    }

    fn sample_rate(&self) -> rodio::SampleRate {
        self.shared.audio.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// A loaded file, driven by the transport.
pub struct PlaybackSource {
    shared: Arc<Shared>,
    sink: Sink,
    path: PathBuf,
}

impl PlaybackSource {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn audio(&self) -> Arc<DecodedAudio> {
        self.shared.audio.clone()
    }

    pub fn duration(&self) -> Duration {
        self.shared.audio.duration()
    }
}

#[cfg(test)]
impl PlaybackSource {
    /// A source on a sink that is not connected to any output device.
    pub fn detached(
        path: &Path,
        audio: DecodedAudio,
        events_tx: mpsc::Sender<SourceEvent>,
    ) -> Self {
        let (sink, _output) = Sink::new();
        Self {
            shared: Arc::new(Shared::new(Arc::new(audio), events_tx)),
            sink,
            path: path.to_path_buf(),
        }
    }
}

impl AudioSource for PlaybackSource {
    fn start(&mut self) {
        self.shared.start();
    }

    fn stop(&mut self) {
        self.shared.stop();
    }

    fn set_position(&mut self, position: Duration) {
        self.shared.set_position(position);
    }

    fn current_position(&self) -> Duration {
        self.shared.current_position()
    }

    fn is_playing(&self) -> bool {
        self.shared.is_playing()
    }

    fn set_looping(&mut self, looping: bool) {
        self.shared.set_looping(looping);
    }
}

impl Drop for PlaybackSource {
    fn drop(&mut self) {
        self.sink.stop();
    }
}
