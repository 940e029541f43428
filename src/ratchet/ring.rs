//! Recent message-key ring for concurrent decrypt attempts.
//!
//! [`RatchetState::decrypt`](crate::ratchet::RatchetState::decrypt) mutates
//! chain state and must be serialized by the caller. The ring gives other
//! threads a second chance: every receive key is also pushed here, and
//! [`KeyRing::try_open`] can verify-and-decrypt under the ring's own lock
//! without touching the state machine. It is an opportunistic cache, not
//! authoritative: a miss means "ask the owner", not "undecryptable".
//!
//! The buffer is bounded at [`RING_CAPACITY`] entries; inserting past
//! capacity evicts the oldest. No lock is ever held across a KDF call.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::trace;

use crate::crypto;
use crate::ratchet::{MessageKey, RING_CAPACITY};

struct RingEntry {
    message_number: u64,
    key: MessageKey,
}

/// Cloneable handle to a bounded ring of recent receive keys.
///
/// Clones share one buffer; all methods take `&self` and synchronize
/// internally.
#[derive(Clone)]
pub struct KeyRing {
    inner: Arc<Mutex<VecDeque<RingEntry>>>,
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing").field("len", &self.len()).finish()
    }
}

impl Default for KeyRing {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyRing {
    /// Creates an empty ring.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(RING_CAPACITY))),
        }
    }

    /// Pushes a key for a ratchet message number, evicting the oldest entry
    /// once the ring is full.
    pub fn insert(&self, message_number: u64, key: MessageKey) {
        let mut ring = self.lock();
        if ring.len() == RING_CAPACITY {
            ring.pop_front();
        }
        ring.push_back(RingEntry {
            message_number,
            key,
        });
    }

    /// Attempts to decrypt with any ring key recorded for `message_number`,
    /// oldest first. Returns the first plaintext that authenticates, or
    /// `None` when no ring key fits.
    pub fn try_open(&self, ciphertext: &[u8], message_number: u64) -> Option<Vec<u8>> {
        let ring = self.lock();
        for entry in ring.iter() {
            if entry.message_number != message_number {
                continue;
            }
            if let Ok(plaintext) = crypto::decrypt(ciphertext, entry.key.as_bytes()) {
                trace!(message_number, "ring key matched ciphertext");
                return Some(plaintext);
            }
        }
        None
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when the ring holds no keys.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Message numbers currently in the ring, oldest first.
    pub fn message_numbers(&self) -> Vec<u64> {
        self.lock().iter().map(|e| e.message_number).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<RingEntry>> {
        // Lock poisoning is ignored; entries are only cached keys.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{random_key, KEY_SIZE};

    #[test]
    fn test_insert_and_try_open() {
        let key = random_key().unwrap();
        let ciphertext = crypto::encrypt(b"ring message", &key).unwrap();

        let ring = KeyRing::new();
        ring.insert(5, MessageKey::from_bytes(*key));

        assert_eq!(ring.try_open(&ciphertext, 5).unwrap(), b"ring message");
    }

    #[test]
    fn test_miss_on_unknown_number() {
        let key = random_key().unwrap();
        let ciphertext = crypto::encrypt(b"ring message", &key).unwrap();

        let ring = KeyRing::new();
        ring.insert(5, MessageKey::from_bytes(*key));

        assert!(ring.try_open(&ciphertext, 6).is_none());
    }

    #[test]
    fn test_wrong_key_same_number_is_a_miss() {
        let key = random_key().unwrap();
        let other = random_key().unwrap();
        let ciphertext = crypto::encrypt(b"ring message", &key).unwrap();

        let ring = KeyRing::new();
        ring.insert(5, MessageKey::from_bytes(*other));

        assert!(ring.try_open(&ciphertext, 5).is_none());
    }

    #[test]
    fn test_duplicate_numbers_scan_in_order() {
        let key = random_key().unwrap();
        let ciphertext = crypto::encrypt(b"ring message", &key).unwrap();

        let ring = KeyRing::new();
        ring.insert(5, MessageKey::from_bytes([0u8; KEY_SIZE]));
        ring.insert(5, MessageKey::from_bytes(*key));

        // The first entry fails authentication; the scan must keep going.
        assert_eq!(ring.try_open(&ciphertext, 5).unwrap(), b"ring message");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let ring = KeyRing::new();
        for n in 0..(RING_CAPACITY as u64 + 4) {
            ring.insert(n, MessageKey::from_bytes([n as u8; KEY_SIZE]));
        }

        assert_eq!(ring.len(), RING_CAPACITY);
        let numbers = ring.message_numbers();
        assert_eq!(numbers.first(), Some(&4));
        assert_eq!(numbers.last(), Some(&(RING_CAPACITY as u64 + 3)));
    }

    #[test]
    fn test_clones_share_the_buffer() {
        let ring = KeyRing::new();
        let handle = ring.clone();

        ring.insert(1, MessageKey::from_bytes([1u8; KEY_SIZE]));
        assert_eq!(handle.len(), 1);
    }
}
