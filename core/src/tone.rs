use crate::charset::Charset;
use crate::config::ModemConfig;
use crate::error::Result;
use std::f64::consts::PI;

/// Generate a pure sinusoid at `frequency`, scaled by `amplitude`, with a
/// linear fade over `fade_samples` at each edge.
///
/// The fade is only applied when `2 * fade_samples < num_samples`; a longer
/// fade would overlap itself and invert the envelope, so the tone is left
/// unshaped instead.
pub fn synthesize_tone(
    frequency: f32,
    num_samples: usize,
    sample_rate: u32,
    amplitude: f32,
    fade_samples: usize,
) -> Vec<f32> {
    let angular = 2.0 * PI * frequency as f64 / sample_rate as f64;
    let mut samples: Vec<f32> = (0..num_samples)
        .map(|n| (amplitude as f64 * (angular * n as f64).sin()) as f32)
        .collect();

    apply_linear_fade(&mut samples, fade_samples);
    samples
}

/// Ramp the first and last `fade_samples` linearly from/to zero.
fn apply_linear_fade(samples: &mut [f32], fade_samples: usize) {
    let len = samples.len();
    if fade_samples == 0 || 2 * fade_samples >= len {
        return;
    }

    for i in 0..fade_samples {
        let gain = i as f32 / fade_samples as f32;
        samples[i] *= gain;
        samples[len - 1 - i] *= gain;
    }
}

/// Precomputed waveforms for every alphabet symbol plus the frame markers
///
/// A bank is built in one pass from a [`ModemConfig`] and never mutated
/// afterwards; new transmission parameters mean a new bank.
#[derive(Debug, Clone)]
pub struct ToneBank {
    charset: Charset,
    tones: Vec<Vec<f32>>,
    preamble: Vec<f32>,
    postamble: Vec<f32>,
    samples_per_tone: usize,
}

impl ToneBank {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        config.validate()?;
        let charset = config.charset()?;

        let samples_per_tone = config.samples_per_tone();
        let fade = config.fade_samples();
        let tone = |frequency: f32, num_samples: usize| {
            synthesize_tone(frequency, num_samples, config.sample_rate, config.amplitude, fade)
        };

        let tones = (0..charset.len())
            .map(|i| tone(charset.frequency_at(i), samples_per_tone))
            .collect();
        let preamble = tone(config.preamble.frequency, config.preamble_samples());
        let postamble = tone(config.postamble.frequency, config.postamble_samples());

        log::debug!(
            "Built tone bank: {} symbols, {} samples per tone, fade {} samples",
            charset.len(),
            samples_per_tone,
            fade
        );

        Ok(Self {
            charset,
            tones,
            preamble,
            postamble,
            samples_per_tone,
        })
    }

    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    pub fn samples_per_tone(&self) -> usize {
        self.samples_per_tone
    }

    /// Waveform for `ch`, or `None` if it is not in the alphabet
    pub fn tone(&self, ch: char) -> Option<&[f32]> {
        self.charset.index_of(ch).map(|i| self.tones[i].as_slice())
    }

    pub fn preamble(&self) -> &[f32] {
        &self.preamble
    }

    pub fn postamble(&self) -> &[f32] {
        &self.postamble
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_length_and_amplitude() {
        let tone = synthesize_tone(600.0, 8820, 44100, 0.5, 0);
        assert_eq!(tone.len(), 8820);
        assert_eq!(tone[0], 0.0);

        let peak = tone.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!((peak - 0.5).abs() < 1e-3, "peak={}", peak);
    }

    #[test]
    fn test_fade_envelope_ramps_edges() {
        let faded = synthesize_tone(1000.0, 1000, 44100, 1.0, 100);
        let plain = synthesize_tone(1000.0, 1000, 44100, 1.0, 0);

        // First and last samples are fully attenuated
        assert_eq!(faded[0], 0.0);
        assert_eq!(faded[999], 0.0);

        // Halfway through the ramp the gain is one half
        assert!((faded[50] - plain[50] * 0.5).abs() < 1e-6);
        assert!((faded[949] - plain[949] * 0.5).abs() < 1e-6);

        // The body is untouched
        for i in 100..900 {
            assert_eq!(faded[i], plain[i]);
        }
    }

    #[test]
    fn test_fade_skipped_when_too_long() {
        let plain = synthesize_tone(1000.0, 100, 44100, 1.0, 0);
        assert_eq!(synthesize_tone(1000.0, 100, 44100, 1.0, 50), plain);
        assert_eq!(synthesize_tone(1000.0, 100, 44100, 1.0, 80), plain);
        assert_ne!(synthesize_tone(1000.0, 100, 44100, 1.0, 49), plain);
    }

    #[test]
    fn test_bank_covers_alphabet() {
        let config = ModemConfig::default();
        let bank = ToneBank::new(&config).unwrap();

        for &ch in bank.charset().symbols() {
            let tone = bank.tone(ch).unwrap();
            assert_eq!(tone.len(), config.samples_per_tone());
        }
        assert!(bank.tone('#').is_none());
        assert!(bank.tone('a').is_none());
        assert_eq!(bank.preamble().len(), config.preamble_samples());
        assert_eq!(bank.postamble().len(), config.postamble_samples());
    }

    #[test]
    fn test_new_parameters_build_a_new_bank() {
        let quiet = ToneBank::new(&ModemConfig::default().with_amplitude(0.1)).unwrap();
        let loud = ToneBank::new(&ModemConfig::default().with_amplitude(0.9)).unwrap();

        let quiet_peak = quiet.tone('A').unwrap().iter().fold(0.0f32, |a, s| a.max(s.abs()));
        let loud_peak = loud.tone('A').unwrap().iter().fold(0.0f32, |a, s| a.max(s.abs()));
        assert!((quiet_peak - 0.1).abs() < 1e-3);
        assert!((loud_peak - 0.9).abs() < 1e-3);

        // Every entry of the faded bank carries the envelope, markers included
        let faded = ToneBank::new(&ModemConfig::default().with_fade_duration(0.01)).unwrap();
        for &ch in faded.charset().symbols() {
            let tone = faded.tone(ch).unwrap();
            assert_eq!(tone[0], 0.0);
            assert_eq!(tone[tone.len() - 1], 0.0);
        }
        assert_eq!(faded.preamble()[0], 0.0);
        assert_eq!(*faded.postamble().last().unwrap(), 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(ToneBank::new(&ModemConfig::default().with_fade_duration(0.3)).is_err());
    }
}
