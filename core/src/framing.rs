use crate::charset::Charset;
use std::fmt;

pub const CHECKSUM_MISMATCH_TAG: &str = "[CHECKSUM MISMATCH]";

/// Transmittable unit: the filtered message plus its checksum symbol
///
/// On air a frame is `preamble | message symbols | checksum | postamble`.
/// A message with no supported characters has no checksum and is sent as
/// the preamble followed by one tone length of silence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    message: String,
    checksum: Option<char>,
}

impl Frame {
    /// Upper-case `text`, keep only alphabet characters and attach the checksum.
    pub fn from_text(charset: &Charset, text: &str) -> Self {
        let message = charset.filter(text);
        let checksum = if message.is_empty() {
            None
        } else {
            Some(charset.checksum(&message))
        };
        Self { message, checksum }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn checksum(&self) -> Option<char> {
        self.checksum
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }

    /// Payload symbols in transmission order, checksum last
    pub fn symbols(&self) -> impl Iterator<Item = char> + '_ {
        self.message.chars().chain(self.checksum)
    }
}

/// Classification of one analyzed chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedSymbol {
    /// Matched alphabet character, `None` when no symbol was within tolerance
    pub character: Option<char>,
    /// Spectral entropy exceeded the configured threshold
    pub uncertain: bool,
}

impl DecodedSymbol {
    pub fn new(character: Option<char>, uncertain: bool) -> Self {
        Self { character, uncertain }
    }
}

/// Best-effort decode result with its integrity annotations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedMessage {
    /// Recognized message characters (checksum symbol excluded)
    pub text: String,
    /// `None` when fewer than two symbols were received and there is no checksum
    pub checksum_ok: Option<bool>,
    /// 1-based message positions of recognized but uncertain characters
    pub uncertain_positions: Vec<usize>,
}

impl DecodedMessage {
    /// Split `symbols` into message and checksum and evaluate both annotations.
    ///
    /// With two or more symbols the last one is the checksum. Positions count
    /// every message symbol, including unrecognized ones, but only recognized
    /// characters are reported as uncertain or summed into the checksum.
    pub fn from_symbols(charset: &Charset, symbols: &[DecodedSymbol]) -> Self {
        let (message, checksum) = match symbols.split_last() {
            Some((last, rest)) if symbols.len() >= 2 => (rest, Some(last)),
            _ => (symbols, None),
        };

        let text: String = message.iter().filter_map(|s| s.character).collect();

        let checksum_ok = checksum.map(|received| {
            let expected = charset.checksum(&text);
            received.character == Some(expected)
        });

        let uncertain_positions = message
            .iter()
            .enumerate()
            .filter(|(_, s)| s.uncertain && s.character.is_some())
            .map(|(i, _)| i + 1)
            .collect();

        Self {
            text,
            checksum_ok,
            uncertain_positions,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.checksum_ok != Some(false) && self.uncertain_positions.is_empty()
    }
}

impl fmt::Display for DecodedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)?;
        if self.checksum_ok == Some(false) {
            write!(f, " {}", CHECKSUM_MISMATCH_TAG)?;
        }
        if !self.uncertain_positions.is_empty() {
            let positions: Vec<String> = self
                .uncertain_positions
                .iter()
                .map(|p| format!("#{}", p))
                .collect();
            write!(f, " [UNCERTAIN characters at positions {}]", positions.join(", "))?;
        }
        Ok(())
    }
}
