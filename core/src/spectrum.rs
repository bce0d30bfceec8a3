//! Per-chunk spectral analysis
//!
//! Every chunk is multiplied by a Hann window and transformed with a real
//! FFT. The strongest bin gives the estimated tone frequency; the Shannon
//! entropy of the normalized magnitude spectrum measures how concentrated
//! that estimate is. A clean tone puts nearly all energy in two or three
//! bins (about 1.5 bits), broadband noise spreads it over all of them.
//!
//! A chunk with zero total magnitude has entropy `f32::INFINITY`: silence is
//! treated as maximal uncertainty everywhere in this crate.

use crate::error::{ModemError, Result};
use realfft::{RealFftPlanner, RealToComplex};
use std::collections::HashMap;
use std::sync::Arc;

/// Guards `log2(0)` for empty bins.
const ENTROPY_EPSILON: f64 = 1e-12;

/// Result of analyzing one chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkAnalysis {
    /// Center frequency of the strongest FFT bin in Hz
    pub dominant_hz: f32,
    /// Spectral entropy in bits
    pub entropy_bits: f32,
}

/// Hann-windowed real FFT analyzer with per-length plan and window caching
pub struct SpectralAnalyzer {
    sample_rate: f32,
    planner: RealFftPlanner<f32>,
    plans: HashMap<usize, (Arc<dyn RealToComplex<f32>>, Vec<f32>)>,
}

impl SpectralAnalyzer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            planner: RealFftPlanner::new(),
            plans: HashMap::new(),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Magnitude spectrum of the Hann-windowed chunk (`len / 2 + 1` bins)
    pub fn magnitudes(&mut self, chunk: &[f32]) -> Result<Vec<f32>> {
        if chunk.is_empty() {
            return Err(ModemError::InsufficientData);
        }

        let len = chunk.len();
        let planner = &mut self.planner;
        let (r2c, window) = self
            .plans
            .entry(len)
            .or_insert_with(|| (planner.plan_fft_forward(len), hann_window(len)));

        let mut input: Vec<f32> = chunk.iter().zip(window.iter()).map(|(s, w)| s * w).collect();
        let mut spectrum = r2c.make_output_vec();
        r2c.process(&mut input, &mut spectrum).map_err(|e| {
            ModemError::FftError(format!("forward FFT failed for {} samples: {:?}", len, e))
        })?;

        Ok(spectrum.iter().map(|c| c.norm()).collect())
    }

    /// Frequency of the strongest bin; ties resolve to the lowest bin.
    pub fn dominant_frequency(&mut self, chunk: &[f32]) -> Result<f32> {
        let magnitudes = self.magnitudes(chunk)?;
        Ok(self.bin_frequency(peak_bin(&magnitudes), chunk.len()))
    }

    /// Shannon entropy (bits) of the normalized magnitude spectrum
    pub fn spectral_entropy(&mut self, chunk: &[f32]) -> Result<f32> {
        let magnitudes = self.magnitudes(chunk)?;
        Ok(entropy_bits(&magnitudes))
    }

    /// Dominant frequency and entropy from a single transform
    pub fn analyze(&mut self, chunk: &[f32]) -> Result<ChunkAnalysis> {
        let magnitudes = self.magnitudes(chunk)?;
        Ok(ChunkAnalysis {
            dominant_hz: self.bin_frequency(peak_bin(&magnitudes), chunk.len()),
            entropy_bits: entropy_bits(&magnitudes),
        })
    }

    fn bin_frequency(&self, bin: usize, len: usize) -> f32 {
        (bin as f64 * self.sample_rate as f64 / len as f64) as f32
    }
}

/// Symmetric Hann window, `0.5 - 0.5 cos(2πn / (N - 1))`
pub fn hann_window(len: usize) -> Vec<f32> {
    if len == 1 {
        return vec![1.0];
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|n| (0.5 - 0.5 * (2.0 * std::f64::consts::PI * n as f64 / denom).cos()) as f32)
        .collect()
}

fn peak_bin(magnitudes: &[f32]) -> usize {
    let mut best = 0;
    for (i, &m) in magnitudes.iter().enumerate() {
        if m > magnitudes[best] {
            best = i;
        }
    }
    best
}

fn entropy_bits(magnitudes: &[f32]) -> f32 {
    let total: f64 = magnitudes.iter().map(|&m| m as f64).sum();
    if total <= 0.0 {
        return f32::INFINITY;
    }

    let entropy: f64 = magnitudes
        .iter()
        .map(|&m| {
            let p = m as f64 / total;
            -p * (p + ENTROPY_EPSILON).log2()
        })
        .sum();
    entropy as f32
}

/// True when every sample in `chunk` is exactly zero
pub fn is_silent(chunk: &[f32]) -> bool {
    chunk.iter().all(|&s| s == 0.0)
}
