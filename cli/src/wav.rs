use hound::{SampleFormat, WavSpec};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tonemodem_core::ModemError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Modem error: {0}")]
    Modem(#[from] ModemError),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Expected mono audio, got {0} channels")]
    NotMono(u16),

    #[error("Unsupported sample format: {bits}-bit {format:?}")]
    UnsupportedFormat { bits: u16, format: SampleFormat },

    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Mono samples in [-1.0, 1.0] together with their sample rate
pub struct Recording {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

/// Write mono 16-bit PCM, clamping to [-1.0, 1.0] before scaling
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), CliError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * 32767.0) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Read a mono WAV file (16-bit PCM or 32-bit float)
pub fn read_wav(path: &Path) -> Result<Recording, CliError> {
    let file = File::open(path)?;
    let mut reader = hound::WavReader::new(BufReader::new(file))?;

    let spec = reader.spec();
    log::info!(
        "Read WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample
    );
    if spec.channels != 1 {
        return Err(CliError::NotMono(spec.channels));
    }

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|s| s as f32 / 32768.0))
            .collect::<Result<Vec<f32>, _>>()?,
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<Vec<f32>, _>>()?,
        (format, bits) => return Err(CliError::UnsupportedFormat { bits, format }),
    };

    Ok(Recording {
        sample_rate: spec.sample_rate,
        samples,
    })
}
