//! X25519 key generation and Diffie-Hellman.
//!
//! Public keys and private scalars are both 32 bytes. Private scalars are
//! zeroized when dropped; a keypair generated here is interchangeable with a
//! NaCl `box` keypair, so the same keys serve the ratchet's DH steps and the
//! [`seal`](crate::crypto::seal)/[`open`](crate::crypto::open) operations.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;
use x25519_dalek::{x25519, X25519_BASEPOINT_BYTES};
use zeroize::ZeroizeOnDrop;

use crate::crypto::KEY_SIZE;
use crate::error::{RatchetboxError, Result};

/// An X25519 public point.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey([u8; KEY_SIZE]);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("key", &hex::encode(&self.0[..8]))
            .finish()
    }
}

impl PublicKey {
    /// Creates a public key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Renders the key as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// An X25519 private scalar. Zeroized on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct PrivateKey([u8; KEY_SIZE]);

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for PrivateKey {}

impl PrivateKey {
    /// Creates a private key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw scalar bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// X25519 scalar multiplication with a peer's public point.
    pub fn diffie_hellman(&self, public: &PublicKey) -> SharedSecret {
        SharedSecret(x25519(self.0, public.0))
    }

    /// Returns the public point matching this scalar.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(x25519(self.0, X25519_BASEPOINT_BYTES))
    }
}

/// A raw Diffie-Hellman shared secret. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct SharedSecret([u8; KEY_SIZE]);

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSecret")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl SharedSecret {
    /// Returns the raw secret bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// A matched X25519 keypair.
#[derive(Clone, PartialEq, Eq)]
pub struct Keypair {
    /// The public point
    pub public: PublicKey,
    /// The private scalar
    pub private: PrivateKey,
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair").field("public", &self.public).finish()
    }
}

impl Keypair {
    /// Generates a fresh keypair from the system RNG.
    pub fn generate() -> Result<Self> {
        let mut scalar = [0u8; KEY_SIZE];
        OsRng
            .try_fill_bytes(&mut scalar)
            .map_err(RatchetboxError::rng)?;
        let private = PrivateKey(scalar);
        let public = private.public_key();
        Ok(Self { public, private })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keypairs_differ() {
        let a = Keypair::generate().unwrap();
        let b = Keypair::generate().unwrap();
        assert_ne!(a.public, b.public);
        assert_ne!(a.private, b.private);
    }

    #[test]
    fn test_public_matches_private() {
        let pair = Keypair::generate().unwrap();
        assert_eq!(pair.private.public_key(), pair.public);
    }

    #[test]
    fn test_diffie_hellman_agreement() {
        let alice = Keypair::generate().unwrap();
        let bob = Keypair::generate().unwrap();

        let ab = alice.private.diffie_hellman(&bob.public);
        let ba = bob.private.diffie_hellman(&alice.public);

        assert_eq!(ab.as_bytes(), ba.as_bytes());
    }

    #[test]
    fn test_distinct_peers_distinct_secrets() {
        let alice = Keypair::generate().unwrap();
        let bob = Keypair::generate().unwrap();
        let carol = Keypair::generate().unwrap();

        let ab = alice.private.diffie_hellman(&bob.public);
        let ac = alice.private.diffie_hellman(&carol.public);

        assert_ne!(ab.as_bytes(), ac.as_bytes());
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let pair = Keypair::generate().unwrap();
        let rendered = format!("{:?}", pair.private);
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains(&pair.private.as_bytes()[0].to_string()));
    }
}
