//! Skipped message keys for out-of-order delivery.
//!
//! When a header shows a message number ahead of the receive counter, the
//! intermediate message keys are derived eagerly and parked here under
//! (remote public key, message number) until their ciphertexts arrive. Keys
//! are removed on lookup; a consumed key is gone for good.

use std::collections::HashMap;
use std::fmt;

use crate::crypto::{PublicKey, KEY_SIZE};
use crate::ratchet::MessageKey;

/// Identifies a derived-but-unconsumed message key.
///
/// Keyed by the remote key's bytes, not its identity, so a header built from
/// a fresh allocation still finds its entry.
#[derive(Clone, PartialEq, Eq, Hash)]
struct SkipId {
    remote_key: [u8; KEY_SIZE],
    message_number: u64,
}

/// Store of message keys whose ciphertexts have not arrived yet.
#[derive(Default)]
pub struct SkippedKeys {
    keys: HashMap<SkipId, MessageKey>,
}

impl fmt::Debug for SkippedKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkippedKeys")
            .field("count", &self.keys.len())
            .finish()
    }
}

impl SkippedKeys {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a key for (remote key, message number).
    pub fn store(&mut self, remote: &PublicKey, message_number: u64, key: MessageKey) {
        self.keys.insert(
            SkipId {
                remote_key: *remote.as_bytes(),
                message_number,
            },
            key,
        );
    }

    /// Removes and returns the key for (remote key, message number).
    pub fn take(&mut self, remote: &PublicKey, message_number: u64) -> Option<MessageKey> {
        self.keys.remove(&SkipId {
            remote_key: *remote.as_bytes(),
            message_number,
        })
    }

    /// Number of keys currently parked.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no keys are parked.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    #[test]
    fn test_store_and_take() {
        let remote = Keypair::generate().unwrap().public;
        let mut skipped = SkippedKeys::new();

        skipped.store(&remote, 4, MessageKey::from_bytes([9u8; KEY_SIZE]));
        assert_eq!(skipped.len(), 1);

        let key = skipped.take(&remote, 4).unwrap();
        assert_eq!(key.as_bytes(), &[9u8; KEY_SIZE]);
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_take_is_consuming() {
        let remote = Keypair::generate().unwrap().public;
        let mut skipped = SkippedKeys::new();

        skipped.store(&remote, 0, MessageKey::from_bytes([1u8; KEY_SIZE]));
        assert!(skipped.take(&remote, 0).is_some());
        assert!(skipped.take(&remote, 0).is_none());
    }

    #[test]
    fn test_keyed_by_value_not_identity() {
        let remote = Keypair::generate().unwrap().public;
        let mut skipped = SkippedKeys::new();

        skipped.store(&remote, 2, MessageKey::from_bytes([3u8; KEY_SIZE]));

        // A freshly built key with the same bytes must hit the same entry.
        let rebuilt = PublicKey::from_bytes(*remote.as_bytes());
        assert!(skipped.take(&rebuilt, 2).is_some());
    }

    #[test]
    fn test_distinct_chains_distinct_entries() {
        let a = Keypair::generate().unwrap().public;
        let b = Keypair::generate().unwrap().public;
        let mut skipped = SkippedKeys::new();

        skipped.store(&a, 1, MessageKey::from_bytes([1u8; KEY_SIZE]));
        skipped.store(&b, 1, MessageKey::from_bytes([2u8; KEY_SIZE]));

        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped.take(&a, 1).unwrap().as_bytes(), &[1u8; KEY_SIZE]);
        assert_eq!(skipped.take(&b, 1).unwrap().as_bytes(), &[2u8; KEY_SIZE]);
    }
}
