//! Pairwise double-ratchet session protocol.
//!
//! Each message is encrypted under a one-time key drawn from a sending or
//! receiving chain; the chains themselves are re-seeded by fresh X25519
//! exchanges carried in message headers. The module implements:
//!
//! - **DH ratchet**: rotate ephemeral keypairs and re-seed both chains when a
//!   header advertises a new remote public key
//! - **Symmetric ratchet**: advance a chain key per message via the
//!   memory-hard chain KDF
//! - **Out-of-order delivery**: cache skipped message keys, bounded per
//!   advance by [`MAX_SKIP`]
//! - **Concurrent decryption**: a small ring of recent receive keys usable
//!   without entering the state machine
//!
//! ## Security Properties
//!
//! - **Forward secrecy**: message keys are dropped once consumed; chain keys
//!   never reproduce an earlier message key
//! - **Post-compromise security**: sessions heal once a round-trip completes
//!   after a compromise, since both chains re-seed from fresh DH output
//!
//! The state machine is single-owner: [`RatchetState`] operations mutate the
//! session and must be serialized by the caller. Only the [`KeyRing`] is safe
//! to share across threads.

pub mod header;
pub mod kdf;
pub mod policy;
pub mod ring;
pub mod skipped;
pub mod state;

pub use header::MessageHeader;
pub use kdf::{ChainKey, MessageKey, RootKey};
pub use policy::{RatchetParams, SecurityLevel};
pub use ring::KeyRing;
pub use skipped::SkippedKeys;
pub use state::RatchetState;

use crate::crypto::KEY_SIZE;

/// Maximum number of message keys skipped in a single receive-chain advance.
pub const MAX_SKIP: u64 = 100;

/// Capacity of the recent message-key ring.
pub const RING_CAPACITY: usize = 16;

/// Domain separator salting every chain-key advance.
///
/// Part of the wire contract with deployed peers: changing any byte changes
/// every derived message key and requires a protocol version bump.
pub const CHAIN_ADVANCE: [u8; KEY_SIZE] = [
    0x01, 0x45, 0x94, 0x74, 0x04, 0x99, 0x29, 0x43, 0x81, 0x24, 0x00, 0x11, 0x69, 0x37, 0x53,
    0x87, 0x92, 0x89, 0x20, 0x34, 0x12, 0x14, 0x88, 0x82, 0x28, 0x38, 0x47, 0x71, 0x70, 0x23,
    0x22, 0x55,
];
