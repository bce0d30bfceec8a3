//! Incremental decoding of audio that is still arriving
//!
//! ```text
//! Unsynchronized --preamble window matched--> Synchronized --postamble chunk--> Done
//! ```
//!
//! The decoder owns an append-only sample buffer and a consumed-sample
//! pointer that only moves forward. Each [`StreamDecoder::feed`] call runs
//! to completion, consuming every complete window or chunk it can, and
//! [`StreamDecoder::current_message`] can be read at any time.
//!
//! The decoder is single-threaded. When capture and display run on
//! different threads, either put it behind one lock or let the capture side
//! own it and publish [`StreamSnapshot`]s to the reader.
//!
//! There is no internal timeout: a stream whose postamble never arrives
//! stays `Synchronized` until the caller drops the decoder.

use crate::config::ModemConfig;
use crate::decoder::{ChunkClassifier, ChunkOutcome};
use crate::error::Result;
use crate::framing::{DecodedMessage, DecodedSymbol};
use crate::spectrum::SpectralAnalyzer;
use crate::sync::PreambleScanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Searching for the preamble
    Unsynchronized,
    /// Preamble found; classifying payload chunks
    Synchronized,
    /// Postamble seen; further input is ignored
    Done,
}

/// Immutable view of decoder progress, cheap to hand to another thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSnapshot {
    pub message: String,
    pub state: DecoderState,
    /// Symbols received so far, checksum candidate included
    pub symbols: usize,
}

impl StreamSnapshot {
    pub fn is_complete(&self) -> bool {
        self.state == DecoderState::Done
    }
}

pub struct StreamDecoder {
    analyzer: SpectralAnalyzer,
    classifier: ChunkClassifier,
    scanner: PreambleScanner,
    samples_per_tone: usize,
    preamble_samples: usize,
    buffer: Vec<f32>,
    consumed: usize,
    state: DecoderState,
    symbols: Vec<DecodedSymbol>,
}

impl StreamDecoder {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            analyzer: SpectralAnalyzer::new(config.sample_rate),
            classifier: ChunkClassifier::new(config)?,
            scanner: PreambleScanner::new(config),
            samples_per_tone: config.samples_per_tone(),
            preamble_samples: config.preamble_samples(),
            buffer: Vec::new(),
            consumed: 0,
            state: DecoderState::Unsynchronized,
            symbols: Vec::new(),
        })
    }

    /// Append `samples` and consume everything that can be decided now.
    ///
    /// Returns the state after processing. Once `Done`, input is discarded.
    pub fn feed(&mut self, samples: &[f32]) -> DecoderState {
        if self.state == DecoderState::Done {
            return self.state;
        }
        self.buffer.extend_from_slice(samples);

        if self.state == DecoderState::Unsynchronized {
            self.search_preamble();
        }
        if self.state == DecoderState::Synchronized {
            self.consume_payload();
        }

        debug_assert!(self.consumed <= self.buffer.len());
        self.state
    }

    fn search_preamble(&mut self) {
        let found = self
            .scanner
            .scan(&mut self.analyzer, &self.buffer, self.buffer.len());

        match found {
            Some(start) => {
                // Payload begins right after the matched window, which is
                // entirely inside the buffer.
                self.consumed = start + self.preamble_samples;
                self.state = DecoderState::Synchronized;
            }
            None => {
                self.consumed = self.scanner.next_start().min(self.buffer.len());
            }
        }
    }

    fn consume_payload(&mut self) {
        while self.consumed + self.samples_per_tone <= self.buffer.len() {
            let chunk = &self.buffer[self.consumed..self.consumed + self.samples_per_tone];
            let outcome = self.classifier.classify(&mut self.analyzer, chunk);
            self.consumed += self.samples_per_tone;

            match outcome {
                ChunkOutcome::Silent => {}
                ChunkOutcome::Postamble => {
                    log::debug!("Postamble after {} symbols, stream complete", self.symbols.len());
                    self.state = DecoderState::Done;
                    return;
                }
                ChunkOutcome::Symbol(symbol) => self.symbols.push(symbol),
            }
        }
    }

    /// Annotated best-effort message from the symbols received so far
    pub fn current_message(&self) -> String {
        self.message().to_string()
    }

    pub fn message(&self) -> DecodedMessage {
        DecodedMessage::from_symbols(self.classifier.charset(), &self.symbols)
    }

    pub fn is_complete(&self) -> bool {
        self.state == DecoderState::Done
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn symbols(&self) -> &[DecodedSymbol] {
        &self.symbols
    }

    /// Samples already examined; never exceeds [`buffered`](Self::buffered)
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn snapshot(&self) -> StreamSnapshot {
        StreamSnapshot {
            message: self.current_message(),
            state: self.state,
            symbols: self.symbols.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;

    #[test]
    fn test_initial_state() {
        let decoder = StreamDecoder::new(&ModemConfig::default()).unwrap();
        assert_eq!(decoder.state(), DecoderState::Unsynchronized);
        assert_eq!(decoder.current_message(), "");
        assert!(!decoder.is_complete());
        assert_eq!(decoder.consumed(), 0);
    }

    #[test]
    fn test_state_transitions() {
        let config = ModemConfig::default();
        let encoder = Encoder::new(&config).unwrap();
        let samples = encoder.encode("OK");
        let mut decoder = StreamDecoder::new(&config).unwrap();

        let pre = config.preamble_samples();
        let spt = config.samples_per_tone();

        assert_eq!(decoder.feed(&samples[..pre - 1]), DecoderState::Unsynchronized);
        assert_eq!(decoder.feed(&samples[pre - 1..pre]), DecoderState::Synchronized);
        assert_eq!(decoder.consumed(), pre);

        // One full symbol, then a partial one that must wait
        decoder.feed(&samples[pre..pre + spt + 10]);
        assert_eq!(decoder.symbols().len(), 1);
        assert_eq!(decoder.current_message(), "O");
        assert_eq!(decoder.consumed(), pre + spt);

        assert_eq!(decoder.feed(&samples[pre + spt + 10..]), DecoderState::Done);
        assert_eq!(decoder.current_message(), "OK");
        assert!(decoder.is_complete());
    }

    #[test]
    fn test_feed_after_done_is_ignored() {
        let config = ModemConfig::default();
        let encoder = Encoder::new(&config).unwrap();
        let mut decoder = StreamDecoder::new(&config).unwrap();

        decoder.feed(&encoder.encode("HI"));
        assert!(decoder.is_complete());
        let buffered = decoder.buffered();
        let before = decoder.snapshot();

        decoder.feed(&encoder.encode("MORE"));
        assert_eq!(decoder.buffered(), buffered);
        assert_eq!(decoder.snapshot(), before);
    }

    #[test]
    fn test_consumed_never_exceeds_buffer() {
        let config = ModemConfig::default();
        let encoder = Encoder::new(&config).unwrap();
        let samples = encoder.encode("ABC");
        let mut decoder = StreamDecoder::new(&config).unwrap();

        for piece in samples.chunks(1000) {
            decoder.feed(piece);
            assert!(decoder.consumed() <= decoder.buffered());
        }
        assert!(decoder.is_complete());
    }

    #[test]
    fn test_silence_stays_unsynchronized() {
        let config = ModemConfig::default();
        let mut decoder = StreamDecoder::new(&config).unwrap();
        for _ in 0..10 {
            decoder.feed(&vec![0.0; 4410]);
        }
        assert_eq!(decoder.state(), DecoderState::Unsynchronized);
        assert_eq!(decoder.current_message(), "");
        assert!(decoder.consumed() <= decoder.buffered());
    }
}
