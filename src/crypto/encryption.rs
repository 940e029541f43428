//! Authenticated encryption: secretbox for symmetric messages, box for
//! public-key seal/open.
//!
//! Both primitives emit the same wire layout:
//!
//! ```text
//! nonce (24 bytes) ‖ authenticated ciphertext (plaintext + 16-byte tag)
//! ```
//!
//! The nonce is generated fresh per call and written into the output buffer;
//! decryption splits it back off before handing the rest to the AEAD.

use crypto_box::SalsaBox;
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Key, Nonce, XSalsa20Poly1305};

use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::crypto::{random_nonce, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use crate::error::{RatchetboxError, Result};

/// Encrypts a message with a symmetric key.
///
/// The output is the random nonce followed by the sealed message; it is
/// `NONCE_SIZE + TAG_SIZE` bytes longer than the plaintext. Fails only if
/// the system RNG cannot produce a nonce.
pub fn encrypt(plaintext: &[u8], key: &[u8; KEY_SIZE]) -> Result<Vec<u8>> {
    let nonce = random_nonce()?;
    let cipher = XSalsa20Poly1305::new(Key::from_slice(key));
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| RatchetboxError::crypto("secretbox seal failed"))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Decrypts a nonce-prefixed symmetric ciphertext.
pub fn decrypt(ciphertext: &[u8], key: &[u8; KEY_SIZE]) -> Result<Vec<u8>> {
    if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
        return Err(RatchetboxError::ShortCiphertext {
            len: ciphertext.len(),
            min: NONCE_SIZE + TAG_SIZE,
        });
    }

    let (nonce, sealed) = ciphertext.split_at(NONCE_SIZE);
    let cipher = XSalsa20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| RatchetboxError::DecryptAuth)
}

/// Encrypts a message to a recipient with public-key cryptography.
pub fn seal(plaintext: &[u8], recipient: &PublicKey, sender: &PrivateKey) -> Result<Vec<u8>> {
    let nonce = random_nonce()?;
    let cipher = SalsaBox::new(
        &crypto_box::PublicKey::from(*recipient.as_bytes()),
        &crypto_box::SecretKey::from(*sender.as_bytes()),
    );
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| RatchetboxError::crypto("box seal failed"))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Decrypts a nonce-prefixed public-key ciphertext from a known sender.
pub fn open(ciphertext: &[u8], sender: &PublicKey, recipient: &PrivateKey) -> Result<Vec<u8>> {
    if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
        return Err(RatchetboxError::ShortCiphertext {
            len: ciphertext.len(),
            min: NONCE_SIZE + TAG_SIZE,
        });
    }

    let (nonce, sealed) = ciphertext.split_at(NONCE_SIZE);
    let cipher = SalsaBox::new(
        &crypto_box::PublicKey::from(*sender.as_bytes()),
        &crypto_box::SecretKey::from(*recipient.as_bytes()),
    );
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| RatchetboxError::DecryptAuth)
}
