//! Error types for ratchetbox operations.

use thiserror::Error;

/// Result type alias for ratchetbox operations.
pub type Result<T> = std::result::Result<T, RatchetboxError>;

/// Main error type for ratchetbox operations.
#[derive(Error, Debug)]
pub enum RatchetboxError {
    /// The RNG could not produce the requested bytes
    #[error("Random generation failed: {0}")]
    Rng(String),

    /// The memory-hard KDF rejected its parameters
    #[error("Key derivation failed: {0}")]
    Kdf(String),

    /// The AEAD rejected the authentication tag
    #[error("Decryption failed: ciphertext authentication rejected")]
    DecryptAuth,

    /// Ciphertext shorter than nonce plus authentication overhead
    #[error("Ciphertext too short: {len} bytes, need at least {min}")]
    ShortCiphertext { len: usize, min: usize },

    /// The receiver was asked to skip past the per-advance limit.
    /// The session cannot recover; tearing it down is the caller's call.
    #[error("Too many skipped messages: message {until} with receive chain at {current}")]
    SkipOverflow { until: u64, current: u64 },

    /// The security-level selector received an unknown level
    #[error("Invalid security level: {0}")]
    InvalidSecurityLevel(String),

    /// An operation ran before the chain or key it needs exists
    #[error("Ratchet state error: {0}")]
    State(String),

    /// Internal cryptographic operation errors
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Wire encoding/decoding errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RatchetboxError {
    /// Creates a new RNG error.
    pub fn rng<T: ToString>(msg: T) -> Self {
        Self::Rng(msg.to_string())
    }

    /// Creates a new key-derivation error.
    pub fn kdf<T: ToString>(msg: T) -> Self {
        Self::Kdf(msg.to_string())
    }

    /// Creates a new invalid-security-level error.
    pub fn invalid_level<T: ToString>(msg: T) -> Self {
        Self::InvalidSecurityLevel(msg.to_string())
    }

    /// Creates a new state error.
    pub fn state<T: ToString>(msg: T) -> Self {
        Self::State(msg.to_string())
    }

    /// Creates a new cryptographic error.
    pub fn crypto<T: ToString>(msg: T) -> Self {
        Self::Crypto(msg.to_string())
    }

    /// Creates a new serialization error.
    pub fn serialization<T: ToString>(msg: T) -> Self {
        Self::Serialization(msg.to_string())
    }
}
