use crate::charset::Charset;
use crate::config::ModemConfig;
use crate::error::Result;
use crate::framing::{DecodedMessage, DecodedSymbol};
use crate::spectrum::{is_silent, SpectralAnalyzer};
use crate::sync::{align_by_entropy, find_preamble, matches_tone};

/// What a single payload chunk turned out to be
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChunkOutcome {
    /// Every sample was zero; the chunk carries nothing
    Silent,
    /// The chunk is the postamble; the frame ends here
    Postamble,
    Symbol(DecodedSymbol),
}

/// Maps payload chunks to symbols
///
/// Shared by the batch and streaming decoders so both classify identical
/// chunks identically.
#[derive(Debug, Clone)]
pub struct ChunkClassifier {
    charset: Charset,
    tolerance: f32,
    entropy_threshold: f32,
    postamble_frequency: Option<f32>,
}

impl ChunkClassifier {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        Ok(Self {
            charset: config.charset()?,
            tolerance: config.tolerance_hz,
            entropy_threshold: config.entropy_threshold,
            postamble_frequency: Some(config.postamble.frequency),
        })
    }

    /// Copy of this classifier for signals sent without frame markers
    pub fn without_postamble(&self) -> Self {
        Self {
            postamble_frequency: None,
            ..self.clone()
        }
    }

    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    /// Classify one chunk. The postamble check comes before symbol matching,
    /// and analysis failures become an empty, uncertain symbol.
    pub fn classify(&self, analyzer: &mut SpectralAnalyzer, chunk: &[f32]) -> ChunkOutcome {
        if is_silent(chunk) {
            return ChunkOutcome::Silent;
        }

        let analysis = match analyzer.analyze(chunk) {
            Ok(analysis) => analysis,
            Err(e) => {
                log::warn!("Chunk of {} samples not analyzed: {}", chunk.len(), e);
                return ChunkOutcome::Symbol(DecodedSymbol::new(None, true));
            }
        };

        if let Some(postamble) = self.postamble_frequency {
            if matches_tone(analysis.dominant_hz, postamble, self.tolerance) {
                return ChunkOutcome::Postamble;
            }
        }

        let character = self.charset.match_frequency(analysis.dominant_hz, self.tolerance);
        let uncertain = analysis.entropy_bits > self.entropy_threshold;
        log::trace!(
            "Chunk {:.1} Hz, {:.2} bits -> {:?}{}",
            analysis.dominant_hz,
            analysis.entropy_bits,
            character,
            if uncertain { " (uncertain)" } else { "" }
        );

        ChunkOutcome::Symbol(DecodedSymbol::new(character, uncertain))
    }
}

/// Batch decoder for a complete, already captured recording
///
/// Locates the preamble within the search window, then classifies
/// consecutive full chunks until the postamble or the end of the signal.
pub struct Decoder {
    config: ModemConfig,
    analyzer: SpectralAnalyzer,
    classifier: ChunkClassifier,
}

impl Decoder {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            analyzer: SpectralAnalyzer::new(config.sample_rate),
            classifier: ChunkClassifier::new(config)?,
        })
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// Decode `samples` into annotated text. Returns an empty string when no
    /// preamble is found.
    pub fn decode(&mut self, samples: &[f32]) -> String {
        self.decode_message(samples).to_string()
    }

    pub fn decode_message(&mut self, samples: &[f32]) -> DecodedMessage {
        let symbols = self.decode_symbols(samples);
        DecodedMessage::from_symbols(self.classifier.charset(), &symbols)
    }

    /// Raw symbol sequence after the preamble, checksum symbol included
    pub fn decode_symbols(&mut self, samples: &[f32]) -> Vec<DecodedSymbol> {
        let Some(preamble_start) = find_preamble(&mut self.analyzer, samples, &self.config) else {
            log::debug!("No preamble within {} samples", self.config.search_limit_samples());
            return Vec::new();
        };

        let payload_start = preamble_start + self.config.preamble_samples();
        self.classify_chunks(&samples[payload_start..])
    }

    /// Decode a signal sent without preamble or postamble, recovering the
    /// chunk alignment by minimum mean spectral entropy.
    ///
    /// Offsets a few samples either side of the true boundary score almost
    /// the same. A trailing partial chunk of at least half a tone is
    /// zero-padded and decoded; a shorter one is dropped.
    pub fn decode_unframed(&mut self, samples: &[f32]) -> DecodedMessage {
        let samples_per_tone = self.config.samples_per_tone();
        let offset = align_by_entropy(&mut self.analyzer, samples, samples_per_tone);
        let classifier = self.classifier.without_postamble();

        let mut aligned = samples[offset.min(samples.len())..].to_vec();
        let remainder = aligned.len() % samples_per_tone;
        if remainder != 0 && 2 * remainder >= samples_per_tone {
            aligned.resize(aligned.len() + samples_per_tone - remainder, 0.0);
        }

        let symbols: Vec<DecodedSymbol> = aligned
            .chunks_exact(samples_per_tone)
            .filter_map(|chunk| match classifier.classify(&mut self.analyzer, chunk) {
                ChunkOutcome::Symbol(symbol) => Some(symbol),
                _ => None,
            })
            .collect();

        DecodedMessage::from_symbols(classifier.charset(), &symbols)
    }

    fn classify_chunks(&mut self, payload: &[f32]) -> Vec<DecodedSymbol> {
        let mut symbols = Vec::new();
        for chunk in payload.chunks_exact(self.config.samples_per_tone()) {
            match self.classifier.classify(&mut self.analyzer, chunk) {
                ChunkOutcome::Silent => continue,
                ChunkOutcome::Postamble => {
                    log::debug!("Postamble after {} symbols", symbols.len());
                    break;
                }
                ChunkOutcome::Symbol(symbol) => symbols.push(symbol),
            }
        }
        symbols
    }
}
