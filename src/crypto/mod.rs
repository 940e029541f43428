//! Curve25519 / XSalsa20-Poly1305 cryptographic primitives.
//!
//! This module provides the capabilities the ratchet core builds on:
//!
//! - **XSalsa20-Poly1305**: symmetric authenticated encryption (secretbox)
//! - **Curve25519 box**: public-key seal/open between two keypairs
//! - **X25519**: keypair generation and Diffie-Hellman
//! - **scrypt**: memory-hard passphrase key derivation
//!
//! Ciphertexts carry their 24-byte nonce as a prefix; see [`encryption`].

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{RatchetboxError, Result};

pub mod encryption;
pub mod keys;
pub mod password;

pub use encryption::{decrypt, encrypt, open, seal};
pub use keys::{Keypair, PrivateKey, PublicKey, SharedSecret};
pub use password::password_key;

/// Symmetric key and curve scalar/point size in bytes.
pub const KEY_SIZE: usize = 32;

/// XSalsa20-Poly1305 nonce size in bytes.
pub const NONCE_SIZE: usize = 24;

/// Poly1305 authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Generates a random symmetric key from the system RNG.
pub fn random_key() -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    OsRng
        .try_fill_bytes(key.as_mut_slice())
        .map_err(RatchetboxError::rng)?;
    Ok(key)
}

/// Generates a random nonce from the system RNG.
pub fn random_nonce() -> Result<[u8; NONCE_SIZE]> {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(RatchetboxError::rng)?;
    Ok(nonce)
}

/// Renders a key as lowercase hex for logs and diagnostics.
pub fn key_to_hex(key: &[u8; KEY_SIZE]) -> String {
    hex::encode(key)
}
