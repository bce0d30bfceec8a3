use crate::config::ModemConfig;
use crate::spectrum::{is_silent, SpectralAnalyzer};

/// True when `detected` lies strictly within `tolerance` Hz of `target`
pub fn matches_tone(detected: f32, target: f32, tolerance: f32) -> bool {
    (detected - target).abs() < tolerance
}

/// Incremental preamble search over a growing sample buffer
///
/// Windows one preamble long are tested at offsets `0, step, 2*step, ...`
/// where `step` is half the preamble length (at least one sample). A window
/// is only tested once it lies entirely inside the buffer, and each window
/// is tested at most once, so feeding a recording piecewise visits exactly
/// the same windows as scanning it whole.
#[derive(Debug, Clone)]
pub struct PreambleScanner {
    frequency: f32,
    tolerance: f32,
    window: usize,
    step: usize,
    next_start: usize,
}

impl PreambleScanner {
    pub fn new(config: &ModemConfig) -> Self {
        let window = config.preamble_samples();
        Self {
            frequency: config.preamble.frequency,
            tolerance: config.tolerance_hz,
            window,
            step: (window / 2).max(1),
            next_start: 0,
        }
    }

    /// Start of the next window to be tested
    pub fn next_start(&self) -> usize {
        self.next_start
    }

    pub fn window_len(&self) -> usize {
        self.window
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Test every untested window that fits in `samples[..available]`.
    ///
    /// Returns the start of the first window whose dominant frequency
    /// matches the preamble. The scanner stops there; later calls resume
    /// after that window.
    pub fn scan(
        &mut self,
        analyzer: &mut SpectralAnalyzer,
        samples: &[f32],
        available: usize,
    ) -> Option<usize> {
        let available = available.min(samples.len());
        while self.next_start + self.window <= available {
            let start = self.next_start;
            self.next_start += self.step;

            let window = &samples[start..start + self.window];
            match analyzer.dominant_frequency(window) {
                Ok(freq) if matches_tone(freq, self.frequency, self.tolerance) => {
                    log::debug!("Preamble detected at sample {} ({:.1} Hz)", start, freq);
                    return Some(start);
                }
                Ok(_) => {}
                Err(e) => log::warn!("Preamble window at {} not analyzed: {}", start, e),
            }
        }
        None
    }
}

/// Locate the preamble within the configured search window of a complete
/// recording. `None` means no signal was detected.
pub fn find_preamble(
    analyzer: &mut SpectralAnalyzer,
    samples: &[f32],
    config: &ModemConfig,
) -> Option<usize> {
    let mut scanner = PreambleScanner::new(config);
    scanner.scan(analyzer, samples, config.search_limit_samples())
}

/// Brute-force alignment for unframed signals
///
/// Tries every offset in `[0, samples_per_tone)` and returns the one whose
/// chunk sequence has the lowest mean spectral entropy. All-zero chunks are
/// left out of the mean; an offset without any non-silent chunk scores
/// infinity. Costs one FFT per chunk per offset, so it only suits short
/// offline recordings.
pub fn align_by_entropy(
    analyzer: &mut SpectralAnalyzer,
    samples: &[f32],
    samples_per_tone: usize,
) -> usize {
    if samples_per_tone == 0 {
        return 0;
    }

    let mut best_offset = 0;
    let mut best_score = f32::INFINITY;

    for offset in 0..samples_per_tone.min(samples.len()) {
        let mut total = 0.0f64;
        let mut counted = 0usize;

        for chunk in samples[offset..].chunks_exact(samples_per_tone) {
            if is_silent(chunk) {
                continue;
            }
            match analyzer.spectral_entropy(chunk) {
                Ok(entropy) => {
                    total += entropy as f64;
                    counted += 1;
                }
                Err(e) => log::warn!("Alignment chunk at offset {} not analyzed: {}", offset, e),
            }
        }

        let score = if counted == 0 {
            f32::INFINITY
        } else {
            (total / counted as f64) as f32
        };
        if score < best_score {
            best_score = score;
            best_offset = offset;
        }
    }

    log::debug!(
        "Aligned unframed signal at offset {} (mean entropy {:.3} bits)",
        best_offset,
        best_score
    );
    best_offset
}
