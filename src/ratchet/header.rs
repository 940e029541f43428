//! Message headers carried in the clear alongside each ciphertext.
//!
//! A header names the sender's current ephemeral public key, the length of
//! the sender's previous sending chain, and the index of this message within
//! the current chain. The receiver needs all three to decide whether to
//! rotate its receive chain and how many intermediate keys to cache.
//!
//! The byte encoding is `32-byte public key ‖ u64 previous chain length ‖
//! u64 message number`; transport framing is the caller's concern.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::{PublicKey, KEY_SIZE};
use crate::error::{RatchetboxError, Result};

/// Serialized header size in bytes.
pub const HEADER_SIZE: usize = KEY_SIZE + 8 + 8;

/// Unencrypted message header containing ratchet information.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageHeader {
    /// Sender's current ephemeral public key
    pub public_key: PublicKey,
    /// Number of messages in the sender's previous sending chain
    pub previous_chain_length: u64,
    /// Index of this message within the current sending chain
    pub message_number: u64,
}

impl fmt::Debug for MessageHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageHeader")
            .field("public_key", &self.public_key)
            .field("previous_chain_length", &self.previous_chain_length)
            .field("message_number", &self.message_number)
            .finish()
    }
}

impl MessageHeader {
    /// Creates a new message header.
    pub fn new(public_key: PublicKey, previous_chain_length: u64, message_number: u64) -> Self {
        Self {
            public_key,
            previous_chain_length,
            message_number,
        }
    }

    /// Encodes the header into its fixed wire layout.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| RatchetboxError::serialization(format!("header encoding failed: {e}")))
    }

    /// Decodes a header from its wire layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| RatchetboxError::serialization(format!("header decoding failed: {e}")))
    }
}
