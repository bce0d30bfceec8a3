use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModemError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Duplicate symbol in alphabet: {0:?}")]
    DuplicateSymbol(char),

    #[error("FFT error: {0}")]
    FftError(String),

    #[error("Insufficient data")]
    InsufficientData,
}

pub type Result<T> = std::result::Result<T, ModemError>;
