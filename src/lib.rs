//! # ratchetbox: double-ratchet secure messaging core
//!
//! A pairwise session protocol providing forward secrecy and post-compromise
//! security for an asynchronous stream of messages between two parties. Each
//! message is encrypted under a one-time key derived from a pair of chains
//! (sending and receiving) that are re-seeded by fresh X25519 exchanges
//! carried in message headers.
//!
//! ## Features
//!
//! - **Per-message keys**: every message is sealed under a unique key from a
//!   one-way chain advance
//! - **Self-healing sessions**: a completed round-trip re-seeds both chains
//!   from fresh DH output
//! - **Out-of-order delivery**: skipped message keys are cached, bounded per
//!   advance by [`ratchet::MAX_SKIP`]
//! - **Concurrent decryption**: a bounded ring of recent receive keys lets
//!   other threads verify-and-decrypt without entering the state machine
//!
//! ## Cryptographic Algorithms
//!
//! - **Symmetric encryption**: XSalsa20-Poly1305 secretbox, 24-byte nonces
//! - **Public-key seal/open**: Curve25519 box
//! - **Key agreement**: X25519
//! - **Chain and root advance**: scrypt, deliberately memory-hard per
//!   message; see [`ratchet::kdf`] for the compatibility note
//!
//! ## Example
//!
//! ```rust,no_run
//! use ratchetbox::crypto::{self, Keypair};
//! use ratchetbox::{RatchetParams, RatchetState, SecurityLevel};
//!
//! # fn main() -> ratchetbox::Result<()> {
//! // Both sides share a bootstrap secret; the receiver published a keypair.
//! let shared = crypto::random_key()?;
//! let receiver_pair = Keypair::generate()?;
//!
//! let params = RatchetParams::new(0, 0, SecurityLevel::Medium);
//! let mut alice = RatchetState::new_sender(params.clone(), &shared, receiver_pair.public)?;
//! let mut bob = RatchetState::new_receiver(params, &shared, receiver_pair);
//!
//! let (header, ciphertext) = alice.encrypt(b"hello bob")?;
//! let plaintext = bob.decrypt(&header, &ciphertext)?;
//! assert_eq!(plaintext, b"hello bob");
//! # Ok(())
//! # }
//! ```
//!
//! The state machine is single-owner: serialize all calls on one
//! [`RatchetState`]. Only the [`ratchet::KeyRing`] handle may be shared
//! across threads.

pub mod crypto;
pub mod error;
pub mod ratchet;

pub use error::{RatchetboxError, Result};
pub use ratchet::{MessageHeader, RatchetParams, RatchetState, SecurityLevel};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
