use crate::charset::Charset;
use crate::error::{ModemError, Result};

/// A reserved framing tone: a pure sinusoid outside the symbol band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerTone {
    /// Tone frequency in Hz
    pub frequency: f32,
    /// Tone length in seconds
    pub duration: f32,
}

/// Transmission and detection parameters shared by encoder and decoders.
///
/// Values are immutable once handed to an [`Encoder`](crate::Encoder) or a
/// decoder; changing a parameter means building a new config (the `with_*`
/// methods return modified copies) and a new codec instance from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModemConfig {
    /// Samples per second, fixed for the whole signal
    pub sample_rate: u32,
    /// Length of one symbol tone in seconds (the decoding quantum)
    pub tone_duration: f32,
    /// Peak amplitude of every generated tone, in (0, 1]
    pub amplitude: f32,
    /// Linear fade-in/fade-out length at each tone edge, in seconds
    pub fade_duration: f32,
    /// Frequency of the first alphabet symbol in Hz
    pub base_frequency: f32,
    /// Spacing between adjacent alphabet symbols in Hz
    pub frequency_step: f32,
    /// Ordered set of transmittable characters
    pub alphabet: String,
    pub preamble: MarkerTone,
    pub postamble: MarkerTone,
    /// Maximum distance between a detected and a nominal frequency
    pub tolerance_hz: f32,
    /// Spectral entropy (bits) above which a symbol is flagged uncertain
    pub entropy_threshold: f32,
    /// How far into a recording the batch decoder looks for the preamble
    pub preamble_search_secs: f32,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            sample_rate: crate::SAMPLE_RATE,
            tone_duration: crate::TONE_DURATION_SECS,
            amplitude: crate::AMPLITUDE,
            fade_duration: crate::FADE_DURATION_SECS,
            base_frequency: crate::BASE_FREQUENCY,
            frequency_step: crate::FREQUENCY_STEP,
            alphabet: crate::CHARSET.to_string(),
            preamble: MarkerTone {
                frequency: crate::PREAMBLE_FREQUENCY,
                duration: crate::PREAMBLE_DURATION_SECS,
            },
            postamble: MarkerTone {
                frequency: crate::POSTAMBLE_FREQUENCY,
                duration: crate::POSTAMBLE_DURATION_SECS,
            },
            tolerance_hz: crate::DEFAULT_TOLERANCE_HZ,
            entropy_threshold: crate::DEFAULT_ENTROPY_THRESHOLD,
            preamble_search_secs: crate::PREAMBLE_SEARCH_SECS,
        }
    }
}

fn duration_to_samples(sample_rate: u32, seconds: f32) -> usize {
    (sample_rate as f64 * seconds as f64).round().max(0.0) as usize
}

impl ModemConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_tone_duration(mut self, seconds: f32) -> Self {
        self.tone_duration = seconds;
        self
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_fade_duration(mut self, seconds: f32) -> Self {
        self.fade_duration = seconds;
        self
    }

    pub fn with_frequency_map(mut self, base_frequency: f32, frequency_step: f32) -> Self {
        self.base_frequency = base_frequency;
        self.frequency_step = frequency_step;
        self
    }

    pub fn with_alphabet(mut self, alphabet: impl Into<String>) -> Self {
        self.alphabet = alphabet.into();
        self
    }

    pub fn with_preamble(mut self, frequency: f32, duration: f32) -> Self {
        self.preamble = MarkerTone { frequency, duration };
        self
    }

    pub fn with_postamble(mut self, frequency: f32, duration: f32) -> Self {
        self.postamble = MarkerTone { frequency, duration };
        self
    }

    pub fn with_tolerance(mut self, tolerance_hz: f32) -> Self {
        self.tolerance_hz = tolerance_hz;
        self
    }

    pub fn with_entropy_threshold(mut self, bits: f32) -> Self {
        self.entropy_threshold = bits;
        self
    }

    pub fn with_preamble_search(mut self, seconds: f32) -> Self {
        self.preamble_search_secs = seconds;
        self
    }

    /// Samples in one symbol tone (one decoding chunk)
    pub fn samples_per_tone(&self) -> usize {
        duration_to_samples(self.sample_rate, self.tone_duration)
    }

    pub fn fade_samples(&self) -> usize {
        duration_to_samples(self.sample_rate, self.fade_duration)
    }

    pub fn preamble_samples(&self) -> usize {
        duration_to_samples(self.sample_rate, self.preamble.duration)
    }

    pub fn postamble_samples(&self) -> usize {
        duration_to_samples(self.sample_rate, self.postamble.duration)
    }

    /// Number of leading samples the batch decoder scans for the preamble
    pub fn search_limit_samples(&self) -> usize {
        duration_to_samples(self.sample_rate, self.preamble_search_secs)
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }

    /// Build the frequency map described by this config.
    pub fn charset(&self) -> Result<Charset> {
        Charset::new(&self.alphabet, self.base_frequency, self.frequency_step)
    }

    /// Reject parameter combinations that would silently produce a broken
    /// waveform or an ambiguous frequency map.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(invalid("sample rate must be positive"));
        }
        if !(self.tone_duration > 0.0) || self.samples_per_tone() == 0 {
            return Err(invalid(format!(
                "tone duration {}s yields no samples at {} Hz",
                self.tone_duration, self.sample_rate
            )));
        }
        if !(self.amplitude > 0.0 && self.amplitude <= 1.0) {
            return Err(invalid(format!("amplitude {} outside (0, 1]", self.amplitude)));
        }
        if !(self.fade_duration >= 0.0) {
            return Err(invalid(format!("fade duration {}s is negative", self.fade_duration)));
        }
        if self.fade_duration >= self.tone_duration {
            return Err(invalid(format!(
                "fade duration {}s must be shorter than tone duration {}s",
                self.fade_duration, self.tone_duration
            )));
        }
        if !(self.tolerance_hz > 0.0) {
            return Err(invalid("tolerance must be positive"));
        }
        if !(self.entropy_threshold > 0.0) {
            return Err(invalid("entropy threshold must be positive"));
        }
        if !(self.preamble_search_secs > 0.0) {
            return Err(invalid("preamble search window must be positive"));
        }

        for (name, marker, samples) in [
            ("preamble", &self.preamble, self.preamble_samples()),
            ("postamble", &self.postamble, self.postamble_samples()),
        ] {
            if !(marker.frequency > 0.0) || marker.frequency >= self.nyquist() {
                return Err(invalid(format!(
                    "{} frequency {} Hz outside (0, {}) Hz",
                    name,
                    marker.frequency,
                    self.nyquist()
                )));
            }
            if !(marker.duration > 0.0) || samples == 0 {
                return Err(invalid(format!("{} duration yields no samples", name)));
            }
        }

        let charset = self.charset()?;
        if charset.highest_frequency() >= self.nyquist() {
            return Err(invalid(format!(
                "highest symbol frequency {} Hz at or above Nyquist {} Hz",
                charset.highest_frequency(),
                self.nyquist()
            )));
        }

        // Marker windows must not overlap any symbol window or each other.
        let guard = 2.0 * self.tolerance_hz;
        for (name, marker) in [("preamble", &self.preamble), ("postamble", &self.postamble)] {
            if let Some((ch, distance)) = charset.nearest(marker.frequency) {
                if distance < guard {
                    return Err(invalid(format!(
                        "{} at {} Hz is within {} Hz of symbol {:?}",
                        name, marker.frequency, guard, ch
                    )));
                }
            }
        }
        if (self.preamble.frequency - self.postamble.frequency).abs() < guard {
            return Err(invalid("preamble and postamble frequencies are indistinguishable"));
        }

        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ModemError {
    ModemError::InvalidConfig(reason.into())
}
