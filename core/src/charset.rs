use crate::error::{ModemError, Result};
use std::collections::HashMap;

/// Bijection between an ordered alphabet and evenly spaced tone frequencies
///
/// Symbol `i` is carried by `base_frequency + i * frequency_step`, so the
/// map is monotonically increasing in alphabet order.
#[derive(Debug, Clone, PartialEq)]
pub struct Charset {
    symbols: Vec<char>,
    index: HashMap<char, usize>,
    base_frequency: f32,
    frequency_step: f32,
}

impl Charset {
    pub fn new(alphabet: &str, base_frequency: f32, frequency_step: f32) -> Result<Self> {
        if alphabet.is_empty() {
            return Err(ModemError::InvalidConfig("alphabet is empty".into()));
        }
        if !(base_frequency > 0.0) {
            return Err(ModemError::InvalidConfig(format!(
                "base frequency {} Hz must be positive",
                base_frequency
            )));
        }
        if !(frequency_step > 0.0) {
            return Err(ModemError::InvalidConfig(format!(
                "frequency step {} Hz must be positive",
                frequency_step
            )));
        }

        let symbols: Vec<char> = alphabet.chars().collect();
        let mut index = HashMap::with_capacity(symbols.len());
        for (i, &ch) in symbols.iter().enumerate() {
            if index.insert(ch, i).is_some() {
                return Err(ModemError::DuplicateSymbol(ch));
            }
        }

        Ok(Self {
            symbols,
            index,
            base_frequency,
            frequency_step,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn contains(&self, ch: char) -> bool {
        self.index.contains_key(&ch)
    }

    pub fn index_of(&self, ch: char) -> Option<usize> {
        self.index.get(&ch).copied()
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.symbols.get(index).copied()
    }

    /// Frequency assigned to the symbol at `index` in alphabet order
    pub fn frequency_at(&self, index: usize) -> f32 {
        self.base_frequency + index as f32 * self.frequency_step
    }

    pub fn frequency_of(&self, ch: char) -> Option<f32> {
        self.index_of(ch).map(|i| self.frequency_at(i))
    }

    pub fn lowest_frequency(&self) -> f32 {
        self.base_frequency
    }

    pub fn highest_frequency(&self) -> f32 {
        self.frequency_at(self.symbols.len().saturating_sub(1))
    }

    /// Closest symbol to `frequency` and its absolute distance in Hz.
    /// On an exact tie the lower-frequency symbol wins.
    pub fn nearest(&self, frequency: f32) -> Option<(char, f32)> {
        let mut best: Option<(char, f32)> = None;
        for (i, &ch) in self.symbols.iter().enumerate() {
            let distance = (self.frequency_at(i) - frequency).abs();
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((ch, distance)),
            }
        }
        best
    }

    /// Map a detected frequency to a symbol, or `None` when the closest
    /// symbol is `tolerance` Hz or further away.
    pub fn match_frequency(&self, frequency: f32, tolerance: f32) -> Option<char> {
        self.nearest(frequency)
            .filter(|&(_, distance)| distance < tolerance)
            .map(|(ch, _)| ch)
    }

    /// Upper-case `text` and drop every character outside the alphabet.
    pub fn filter(&self, text: &str) -> String {
        text.to_uppercase()
            .chars()
            .filter(|ch| self.contains(*ch))
            .collect()
    }

    /// Checksum symbol: the alphabet entry at (sum of code points) mod |alphabet|.
    ///
    /// Characters outside the alphabet do not contribute.
    pub fn checksum(&self, message: &str) -> char {
        let sum: u64 = message
            .chars()
            .filter(|ch| self.contains(*ch))
            .map(|ch| ch as u64)
            .sum();
        self.symbols[(sum % self.symbols.len() as u64) as usize]
    }
}
