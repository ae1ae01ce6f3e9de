//! Whole-file waveform summary for the playhead view.
//!
//! A thumbnail is a list of min/max peak pairs covering the entire file. It
//! is computed on a background thread from the already decoded samples and
//! delivered through a channel, so loading a long file never stalls the
//! event loop.

use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use super::decoder::DecodedAudio;

/// Downsampled waveform data representing the entire audio timeline
#[derive(Debug, Clone)]
pub struct Thumbnail {
    /// Peak min/max pairs for each downsampled segment
    peaks: Vec<(f32, f32)>,
    duration: Duration,
}

/// A finished thumbnail, tagged with the file it was built for.
pub struct ThumbnailReady {
    pub path: PathBuf,
    pub thumbnail: Thumbnail,
}

impl Thumbnail {
    /// Build a thumbnail of `target_peaks` peak pairs from interleaved samples.
    pub fn build(audio: &DecodedAudio, target_peaks: usize) -> Self {
        let channels = audio.channels.max(1) as usize;

        // Mix down to mono
        let mono: Vec<f32> = audio
            .samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        let samples_per_peak = mono.len().div_ceil(target_peaks.max(1)).max(1);

        let peaks = mono
            .chunks(samples_per_peak)
            .map(|chunk| {
                let min = chunk.iter().copied().fold(f32::INFINITY, f32::min);
                let max = chunk.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                (min, max)
            })
            .collect();

        Self {
            peaks,
            duration: audio.duration(),
        }
    }

    /// Build a thumbnail on a worker thread. The receiver yields exactly one
    /// result unless the worker panics.
    pub fn spawn(
        path: PathBuf,
        audio: Arc<DecodedAudio>,
        target_peaks: usize,
    ) -> mpsc::Receiver<ThumbnailReady> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let thumbnail = Self::build(&audio, target_peaks);
            log::debug!(
                "Thumbnail ready for {}: {} peaks",
                path.display(),
                thumbnail.peaks.len()
            );
            let _ = tx.send(ThumbnailReady { path, thumbnail });
        });

        rx
    }

    /// Get a subset of peaks for the given display width
    ///
    /// If the display width is less than the number of peaks, this will
    /// downsample further by taking representative peaks.
    pub fn display_peaks(&self, display_width: usize) -> Vec<(f32, f32)> {
        if display_width >= self.peaks.len() {
            return self.peaks.clone();
        }

        let peaks_per_pixel = self.peaks.len() as f32 / display_width as f32;

        (0..display_width)
            .map(|i| {
                let start_idx = (i as f32 * peaks_per_pixel) as usize;
                let end_idx = (((i + 1) as f32 * peaks_per_pixel) as usize).min(self.peaks.len());

                self.peaks[start_idx.min(end_idx)..end_idx]
                    .iter()
                    .fold(None, |acc: Option<(f32, f32)>, &(min, max)| match acc {
                        Some((lo, hi)) => Some((lo.min(min), hi.max(max))),
                        None => Some((min, max)),
                    })
                    .unwrap_or((0.0, 0.0))
            })
            .collect()
    }

    /// Horizontal playhead coordinate for a display `width` wide.
    pub fn playhead_x(&self, position: Duration, width: f64) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        let ratio = position.as_secs_f64() / self.duration.as_secs_f64();
        ratio.clamp(0.0, 1.0) * width
    }
}
