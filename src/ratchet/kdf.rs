//! Root- and chain-key derivation.
//!
//! Both advances run scrypt, not the HKDF of the textbook Double Ratchet.
//! That choice is the wire contract with deployed peers and must be kept for
//! bit-compatibility: every step computes
//! `scrypt(secret, salt, N, r = 8, p = 1)` for 64 bytes and splits the output
//! into two 32-byte keys. `N` comes from the session's security level, so a
//! chain advance deliberately carries the configured memory-hard cost, tens
//! to hundreds of milliseconds per message at the default levels. Peers
//! should be told about this trade-off explicitly; it is not a conventional
//! ratchet construction.

use scrypt::{scrypt, Params};
use std::fmt;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::crypto::{SharedSecret, KEY_SIZE};
use crate::error::{RatchetboxError, Result};
use crate::ratchet::CHAIN_ADVANCE;

const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

/// Runs the memory-hard KDF, validating the work factor first.
fn kdf_memhard(secret: &[u8], salt: &[u8], n: u32, out: &mut [u8]) -> Result<()> {
    if n <= 1 || !n.is_power_of_two() {
        return Err(RatchetboxError::kdf(format!(
            "scrypt N must be > 1 and a power of 2, got {n}"
        )));
    }
    let params = Params::new(n.trailing_zeros() as u8, SCRYPT_R, SCRYPT_P, out.len())
        .map_err(RatchetboxError::kdf)?;
    scrypt(secret, salt, &params, out).map_err(RatchetboxError::kdf)
}

/// A root chain key.
#[derive(Clone, ZeroizeOnDrop)]
pub struct RootKey([u8; KEY_SIZE]);

impl fmt::Debug for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootKey").field("key", &"[REDACTED]").finish()
    }
}

impl RootKey {
    /// Creates a root key from bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Root-key step: mixes a fresh DH output into the root chain.
    ///
    /// Returns the next root key and a new chain key; the 64-byte scrypt
    /// intermediate is zeroized after the split.
    pub fn ratchet(&self, dh_output: &SharedSecret, scrypt_n: u32) -> Result<(RootKey, ChainKey)> {
        let mut okm = Zeroizing::new([0u8; KEY_SIZE * 2]);
        kdf_memhard(&self.0, dh_output.as_bytes(), scrypt_n, okm.as_mut_slice())?;

        let mut root = [0u8; KEY_SIZE];
        let mut chain = [0u8; KEY_SIZE];
        root.copy_from_slice(&okm[..KEY_SIZE]);
        chain.copy_from_slice(&okm[KEY_SIZE..]);
        Ok((RootKey(root), ChainKey(chain)))
    }
}

/// A per-direction chain key.
#[derive(Clone, ZeroizeOnDrop)]
pub struct ChainKey([u8; KEY_SIZE]);

impl fmt::Debug for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainKey").field("key", &"[REDACTED]").finish()
    }
}

impl ChainKey {
    /// Creates a chain key from bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Chain-key step: derives the next chain key and a one-time message key.
    ///
    /// The salt is the fixed [`CHAIN_ADVANCE`] domain separator; the 64-byte
    /// intermediate is zeroized after the split.
    pub fn advance(&self, scrypt_n: u32) -> Result<(ChainKey, MessageKey)> {
        let mut okm = Zeroizing::new([0u8; KEY_SIZE * 2]);
        kdf_memhard(&self.0, &CHAIN_ADVANCE, scrypt_n, okm.as_mut_slice())?;

        let mut chain = [0u8; KEY_SIZE];
        let mut message = [0u8; KEY_SIZE];
        chain.copy_from_slice(&okm[..KEY_SIZE]);
        message.copy_from_slice(&okm[KEY_SIZE..]);
        Ok((ChainKey(chain), MessageKey(message)))
    }
}

/// A one-time message key.
#[derive(Clone, ZeroizeOnDrop)]
pub struct MessageKey([u8; KEY_SIZE]);

impl fmt::Debug for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl MessageKey {
    /// Creates a message key from bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the key bytes for use in encryption.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}
