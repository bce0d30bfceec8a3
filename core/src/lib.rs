//! Acoustic text modem
//!
//! Turns short text messages into frequency-shift-keyed tone sequences and
//! recovers annotated text from captured audio, either from a complete
//! recording or incrementally while samples are still arriving.

pub mod error;
pub mod config;
pub mod charset;
pub mod tone;
pub mod framing;
pub mod spectrum;
pub mod sync;
pub mod encoder;
pub mod decoder;
pub mod stream;

pub use charset::Charset;
pub use config::{MarkerTone, ModemConfig};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{ModemError, Result};
pub use framing::{DecodedMessage, DecodedSymbol, Frame};
pub use stream::{DecoderState, StreamDecoder, StreamSnapshot};
pub use tone::ToneBank;

// Signal configuration
pub const SAMPLE_RATE: u32 = 44100;
pub const TONE_DURATION_SECS: f32 = 0.2;
pub const AMPLITUDE: f32 = 0.5;
pub const FADE_DURATION_SECS: f32 = 0.0;

// Frequency map configuration
pub const CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 .,?!";
pub const BASE_FREQUENCY: f32 = 600.0; // Hz
pub const FREQUENCY_STEP: f32 = 60.0; // Hz, top symbol at 3000 Hz

// Frame markers, kept outside the symbol band
pub const PREAMBLE_FREQUENCY: f32 = 400.0; // Hz
pub const PREAMBLE_DURATION_SECS: f32 = 0.3;
pub const POSTAMBLE_FREQUENCY: f32 = 3400.0; // Hz
pub const POSTAMBLE_DURATION_SECS: f32 = 0.3;

// Decoder configuration
pub const DEFAULT_TOLERANCE_HZ: f32 = 20.0;
pub const DEFAULT_ENTROPY_THRESHOLD: f32 = 5.0; // bits
pub const PREAMBLE_SEARCH_SECS: f32 = 5.0;

/// Encode `text` into a complete frame using `config`.
pub fn encode(text: &str, config: &ModemConfig) -> Result<Vec<f32>> {
    let encoder = Encoder::new(config)?;
    Ok(encoder.encode(text))
}

/// Decode a complete recording into annotated text using `config`.
///
/// The only failure is an invalid configuration; every recording, including
/// silence and noise, yields a (possibly empty) message.
pub fn decode(samples: &[f32], config: &ModemConfig) -> Result<String> {
    let mut decoder = Decoder::new(config)?;
    Ok(decoder.decode(samples))
}
