use crate::config::ModemConfig;
use crate::error::Result;
use crate::framing::Frame;
use crate::tone::ToneBank;
use std::sync::Arc;

/// Frame builder turning text into a tone sequence
///
/// Holds a shared, immutable [`ToneBank`]; encoding is a pure function of
/// the text and that bank, so one encoder (or several sharing a bank) can
/// be used from any number of threads.
///
/// Output layout: preamble + one tone per message character + checksum tone
/// + postamble. Text is upper-cased and characters outside the alphabet are
/// dropped before the checksum is computed.
#[derive(Debug, Clone)]
pub struct Encoder {
    bank: Arc<ToneBank>,
}

impl Encoder {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        Ok(Self::from_bank(Arc::new(ToneBank::new(config)?)))
    }

    pub fn from_bank(bank: Arc<ToneBank>) -> Self {
        Self { bank }
    }

    pub fn bank(&self) -> &Arc<ToneBank> {
        &self.bank
    }

    /// Filter `text` and attach its checksum
    pub fn frame(&self, text: &str) -> Frame {
        Frame::from_text(self.bank.charset(), text)
    }

    pub fn encode(&self, text: &str) -> Vec<f32> {
        self.encode_frame(&self.frame(text))
    }

    /// Render a frame. An empty frame becomes the preamble followed by one
    /// tone length of silence, with no checksum or postamble.
    pub fn encode_frame(&self, frame: &Frame) -> Vec<f32> {
        let bank = &self.bank;
        let tone_len = bank.samples_per_tone();

        if frame.is_empty() {
            let mut samples = Vec::with_capacity(bank.preamble().len() + tone_len);
            samples.extend_from_slice(bank.preamble());
            samples.resize(samples.len() + tone_len, 0.0);
            return samples;
        }

        let payload = self.payload(frame);
        let mut samples =
            Vec::with_capacity(bank.preamble().len() + payload.len() + bank.postamble().len());
        samples.extend_from_slice(bank.preamble());
        samples.extend_from_slice(&payload);
        samples.extend_from_slice(bank.postamble());

        log::debug!(
            "Encoded {:?} ({} symbols, checksum {:?}) into {} samples",
            frame.message(),
            frame.message().chars().count(),
            frame.checksum(),
            samples.len()
        );
        samples
    }

    /// Payload and checksum tones only, without preamble or postamble.
    ///
    /// Receivers must recover alignment themselves
    /// (see [`Decoder::decode_unframed`](crate::Decoder::decode_unframed)).
    pub fn encode_unframed(&self, text: &str) -> Vec<f32> {
        self.payload(&self.frame(text))
    }

    fn payload(&self, frame: &Frame) -> Vec<f32> {
        let mut samples = Vec::new();
        for ch in frame.symbols() {
            // Frame symbols are always alphabet members
            if let Some(tone) = self.bank.tone(ch) {
                samples.extend_from_slice(tone);
            }
        }
        samples
    }
}
