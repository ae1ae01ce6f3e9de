//! Format-aware file decoding.
//!
//! Files are decoded fully into memory as interleaved `f32` samples in the
//! range [-1.0, 1.0]. The format is picked from the file extension: WAV goes
//! through hound, FLAC through claxon. Anything else is rejected.

use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }
}

pub fn decode_file(path: &Path) -> Result<DecodedAudio, Box<dyn Error>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let audio = match ext.as_str() {
        "wav" => decode_wav(path)?,
        "flac" => decode_flac(path)?,
        _ => return Err(format!("Unsupported audio format: {ext}").into()),
    };

    if audio.channels == 0 || audio.sample_rate == 0 {
        return Err(format!("Invalid stream parameters in {}", path.display()).into());
    }
    if audio.frames() == 0 {
        return Err(format!("No audio frames in {}", path.display()).into());
    }

    log::info!(
        "Decoded {}: {} Hz, {} channels, {:?}",
        path.display(),
        audio.sample_rate,
        audio.channels,
        audio.duration()
    );

    Ok(audio)
}

fn decode_wav(path: &Path) -> Result<DecodedAudio, Box<dyn Error>> {
    let mut reader = hound::WavReader::new(BufReader::new(File::open(path)?))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = int_scale(spec.bits_per_sample as u32)?;
            match spec.bits_per_sample {
                8 => reader
                    .samples::<i8>()
                    .map(|s| s.map(|s| s as f32 / scale))
                    .collect::<Result<_, _>>()?,
                16 => reader
                    .samples::<i16>()
                    .map(|s| s.map(|s| s as f32 / scale))
                    .collect::<Result<_, _>>()?,
                _ => reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / scale))
                    .collect::<Result<_, _>>()?,
            }
        }
    };

    Ok(DecodedAudio {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

fn decode_flac(path: &Path) -> Result<DecodedAudio, Box<dyn Error>> {
    let mut reader = claxon::FlacReader::open(path)?;
    let info = reader.streaminfo();
    let scale = int_scale(info.bits_per_sample)?;

    let samples = reader
        .samples()
        .map(|s| s.map(|s| s as f32 / scale))
        .collect::<Result<Vec<f32>, _>>()?;

    Ok(DecodedAudio {
        samples,
        channels: info.channels as u16,
        sample_rate: info.sample_rate,
    })
}

fn int_scale(bits_per_sample: u32) -> Result<f32, Box<dyn Error>> {
    match bits_per_sample {
        1..=32 => Ok((1u64 << (bits_per_sample - 1)) as f32),
        _ => Err(format!("Unsupported bit depth: {bits_per_sample}").into()),
    }
}
