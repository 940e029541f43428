//! The double-ratchet state machine.
//!
//! One [`RatchetState`] tracks one direction-pair of a session. The sending
//! side boots from a shared symmetric key and the receiver's public key; the
//! receiving side boots from the same symmetric key and its own published
//! keypair. From there every encrypted message advances the sending chain,
//! and every decrypted message advances the receiving chain, rotating both
//! chains through a fresh DH exchange whenever a header advertises a new
//! remote public key.
//!
//! All operations here mutate the state and are **not** safe to call
//! concurrently on one session; callers must serialize them. Each chain or
//! root advance runs the memory-hard chain KDF, so a single call can take
//! tens to hundreds of milliseconds at the configured level. The shared
//! [`KeyRing`] handle is the one structure other threads may poke while the
//! owner is inside `decrypt`.
//!
//! Dropping the state zeroizes the private scalar, both chains, every parked
//! skipped key, and the ring's keys.

use std::fmt;
use tracing::debug;

use crate::crypto::{self, Keypair, PublicKey, KEY_SIZE};
use crate::error::{RatchetboxError, Result};
use crate::ratchet::{
    ChainKey, KeyRing, MessageHeader, MessageKey, RatchetParams, RootKey, SecurityLevel,
    SkippedKeys, MAX_SKIP,
};

/// Complete per-peer state for the double ratchet.
pub struct RatchetState {
    /// Last-known remote ephemeral public key; None until the first receive
    remote_key: Option<PublicKey>,
    /// Current root chain key
    root_key: RootKey,
    /// Sending chain; None on a receiver that has not ratcheted yet
    send_chain: Option<ChainKey>,
    /// Receiving chain; None between ratchet steps
    recv_chain: Option<ChainKey>,
    /// Messages sent in the previous sending chain
    previous_chain_length: u64,
    /// Index of the next outbound message in the current sending chain
    send_count: u64,
    /// Index of the next expected message in the current receiving chain
    recv_count: u64,
    /// Our current ephemeral keypair
    keypair: Keypair,
    /// Message keys derived ahead of their ciphertexts
    skipped: SkippedKeys,
    /// Most recently produced message key, exposed for caller inspection
    message_key: MessageKey,
    /// Recent receive keys for concurrent decrypt attempts
    ring: KeyRing,
    /// Work factor and forced-ratchet policy
    params: RatchetParams,
}

impl fmt::Debug for RatchetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RatchetState")
            .field("has_remote_key", &self.remote_key.is_some())
            .field("has_send_chain", &self.send_chain.is_some())
            .field("has_recv_chain", &self.recv_chain.is_some())
            .field("send_count", &self.send_count)
            .field("recv_count", &self.recv_count)
            .field("skipped", &self.skipped.len())
            .finish()
    }
}

impl RatchetState {
    /// Initializes the sending side of a session.
    ///
    /// Generates a fresh ephemeral keypair and seeds the root and sending
    /// chains from `symkey` mixed with a DH against `remote_key`. The
    /// receiving chain stays empty until the peer's first header arrives.
    pub fn new_sender(
        params: RatchetParams,
        symkey: &[u8; KEY_SIZE],
        remote_key: PublicKey,
    ) -> Result<Self> {
        let keypair = Keypair::generate()?;
        let dh = keypair.private.diffie_hellman(&remote_key);
        let (root_key, send_chain) =
            RootKey::from_bytes(*symkey).ratchet(&dh, params.scrypt_n())?;

        Ok(Self {
            remote_key: Some(remote_key),
            root_key,
            send_chain: Some(send_chain),
            recv_chain: None,
            previous_chain_length: 0,
            send_count: 0,
            recv_count: 0,
            keypair,
            skipped: SkippedKeys::new(),
            message_key: MessageKey::from_bytes(*symkey),
            ring: KeyRing::new(),
            params,
        })
    }

    /// Initializes the receiving side of a session with its published
    /// keypair. Both chains stay empty until the sender's first header
    /// triggers a DH ratchet.
    pub fn new_receiver(params: RatchetParams, symkey: &[u8; KEY_SIZE], keypair: Keypair) -> Self {
        Self {
            remote_key: None,
            root_key: RootKey::from_bytes(*symkey),
            send_chain: None,
            recv_chain: None,
            previous_chain_length: 0,
            send_count: 0,
            recv_count: 0,
            keypair,
            skipped: SkippedKeys::new(),
            message_key: MessageKey::from_bytes(*symkey),
            ring: KeyRing::new(),
            params,
        }
    }

    /// Builds the header the next outbound message would carry.
    pub fn header(&self) -> MessageHeader {
        MessageHeader::new(
            self.keypair.public,
            self.previous_chain_length,
            self.send_count,
        )
    }

    /// Encrypts a message, advancing the sending chain by one step.
    ///
    /// Returns the clear header and the nonce-prefixed ciphertext. The
    /// derived message key is recorded as [`message_key`](Self::message_key).
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<(MessageHeader, Vec<u8>)> {
        let chain = self
            .send_chain
            .as_ref()
            .ok_or_else(|| RatchetboxError::state("no sending chain"))?;
        let (next_chain, message_key) = chain.advance(self.params.scrypt_n())?;

        let header = self.header();
        self.send_chain = Some(next_chain);
        self.send_count += 1;

        let ciphertext = crypto::encrypt(plaintext, message_key.as_bytes())?;
        self.message_key = message_key;
        Ok((header, ciphertext))
    }

    /// Decrypts a message, advancing the receiving chain as needed.
    ///
    /// Checks the skipped-key store first, rotates the receive chain if the
    /// header advertises a new remote key, caches keys for any messages that
    /// overtook this one, then decrypts. A failed authentication leaves the
    /// session advanced past the message; whether to drop it or tear the
    /// session down is the caller's decision.
    pub fn decrypt(&mut self, header: &MessageHeader, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if let Some(plaintext) = self.try_skipped(header, ciphertext)? {
            return Ok(plaintext);
        }

        if self.remote_key != Some(header.public_key) {
            self.skip_message_keys(header.previous_chain_length)?;
            self.dh_ratchet(header)?;
        }
        self.skip_message_keys(header.message_number)?;

        let chain = self
            .recv_chain
            .as_ref()
            .ok_or_else(|| RatchetboxError::state("no receiving chain"))?;
        let (next_chain, message_key) = chain.advance(self.params.scrypt_n())?;
        self.recv_chain = Some(next_chain);
        self.recv_count += 1;

        self.ring.insert(header.message_number, message_key.clone());
        self.message_key = message_key;
        crypto::decrypt(ciphertext, self.message_key.as_bytes())
    }

    /// Looks the header up in the skipped-key store and, on a hit, decrypts
    /// with the parked key. The key is consumed either way; an
    /// authentication failure propagates rather than falling through to the
    /// chain machinery, so a replayed header cannot trigger a spurious
    /// ratchet.
    fn try_skipped(
        &mut self,
        header: &MessageHeader,
        ciphertext: &[u8],
    ) -> Result<Option<Vec<u8>>> {
        match self.skipped.take(&header.public_key, header.message_number) {
            Some(key) => {
                let plaintext = crypto::decrypt(ciphertext, key.as_bytes())?;
                self.message_key = key;
                Ok(Some(plaintext))
            }
            None => Ok(None),
        }
    }

    /// Derives and parks receive keys until `recv_count` reaches `until`.
    ///
    /// Fails with [`SkipOverflow`](RatchetboxError::SkipOverflow) when the
    /// gap exceeds [`MAX_SKIP`]; the session cannot recover from that.
    fn skip_message_keys(&mut self, until: u64) -> Result<()> {
        if self.recv_count + MAX_SKIP < until {
            return Err(RatchetboxError::SkipOverflow {
                until,
                current: self.recv_count,
            });
        }
        if self.recv_chain.is_none() || self.recv_count >= until {
            return Ok(());
        }
        let remote = self
            .remote_key
            .ok_or_else(|| RatchetboxError::state("no remote key for skipped messages"))?;

        debug!(from = self.recv_count, until, "caching skipped message keys");
        while self.recv_count < until {
            let Some(chain) = &self.recv_chain else { break };
            let (next_chain, message_key) = chain.advance(self.params.scrypt_n())?;
            self.skipped.store(&remote, self.recv_count, message_key);
            self.recv_chain = Some(next_chain);
            self.recv_count += 1;
        }
        Ok(())
    }

    /// Rotates to a new remote public key: rolls the counters, re-seeds the
    /// receiving chain from a DH against the new key, generates a fresh
    /// keypair, and re-seeds the sending chain from a second DH.
    fn dh_ratchet(&mut self, header: &MessageHeader) -> Result<()> {
        debug!(
            previous_chain_length = self.send_count,
            "rotating to new remote ratchet key"
        );
        self.previous_chain_length = self.send_count;
        self.send_count = 0;
        self.recv_count = 0;
        self.remote_key = Some(header.public_key);

        let dh = self.keypair.private.diffie_hellman(&header.public_key);
        let (root_key, recv_chain) = self.root_key.ratchet(&dh, self.params.scrypt_n())?;
        self.root_key = root_key;
        self.recv_chain = Some(recv_chain);

        self.keypair = Keypair::generate()?;
        let dh = self.keypair.private.diffie_hellman(&header.public_key);
        let (root_key, send_chain) = self.root_key.ratchet(&dh, self.params.scrypt_n())?;
        self.root_key = root_key;
        self.send_chain = Some(send_chain);
        Ok(())
    }

    /// The most recently produced message key.
    pub fn message_key(&self) -> &MessageKey {
        &self.message_key
    }

    /// A shared handle to the recent receive-key ring.
    pub fn ring(&self) -> KeyRing {
        self.ring.clone()
    }

    /// The last-known remote ephemeral public key.
    pub fn remote_key(&self) -> Option<&PublicKey> {
        self.remote_key.as_ref()
    }

    /// Our current ephemeral public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.keypair.public
    }

    /// Number of message keys parked for out-of-order delivery.
    pub fn skipped_key_count(&self) -> usize {
        self.skipped.len()
    }

    /// Installs the forced-ratchet policy and work factor for this session,
    /// resetting the trigger counters.
    pub fn set_ratchet(&mut self, count: u32, period_hours: u64, level: SecurityLevel) {
        self.params = RatchetParams::new(count, period_hours, level);
    }

    /// Advisory check for a forced DH ratchet; see
    /// [`RatchetParams::should_ratchet`].
    pub fn should_ratchet(&mut self) -> bool {
        self.params.should_ratchet()
    }

    /// The session's scrypt work parameter.
    pub fn scrypt_n(&self) -> u32 {
        self.params.scrypt_n()
    }

    /// Overrides the session's scrypt work parameter.
    pub fn set_scrypt_n(&mut self, n: u32) {
        self.params.set_scrypt_n(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::random_key;

    // Tiny power of two keeps the memory-hard work out of the test loop.
    fn test_params() -> RatchetParams {
        let mut params = RatchetParams::new(0, 0, SecurityLevel::VeryLow);
        params.set_scrypt_n(16);
        params
    }

    fn session() -> (RatchetState, RatchetState) {
        let symkey = random_key().unwrap();
        let receiver_pair = Keypair::generate().unwrap();
        let sender =
            RatchetState::new_sender(test_params(), &symkey, receiver_pair.public).unwrap();
        let receiver = RatchetState::new_receiver(test_params(), &symkey, receiver_pair);
        (sender, receiver)
    }

    #[test]
    fn test_sender_boots_with_send_chain_only() {
        let (sender, receiver) = session();
        assert!(sender.send_chain.is_some());
        assert!(sender.recv_chain.is_none());
        assert!(sender.remote_key.is_some());
        assert!(receiver.send_chain.is_none());
        assert!(receiver.recv_chain.is_none());
        assert!(receiver.remote_key.is_none());
    }

    #[test]
    fn test_receiver_cannot_encrypt_before_first_receive() {
        let (_, mut receiver) = session();
        assert!(matches!(
            receiver.encrypt(b"too early"),
            Err(RatchetboxError::State(_))
        ));
    }

    #[test]
    fn test_encrypt_then_decrypt() {
        let (mut alice, mut bob) = session();

        let (header, ciphertext) = alice.encrypt(b"hello bob").unwrap();
        assert_eq!(header.message_number, 0);
        assert_eq!(header.previous_chain_length, 0);

        let plaintext = bob.decrypt(&header, &ciphertext).unwrap();
        assert_eq!(plaintext, b"hello bob");
        assert_eq!(bob.recv_count, 1);
    }

    #[test]
    fn test_header_numbers_advance() {
        let (mut alice, _) = session();
        let (first, _) = alice.encrypt(b"one").unwrap();
        let (second, _) = alice.encrypt(b"two").unwrap();
        assert_eq!(first.message_number, 0);
        assert_eq!(second.message_number, 1);
        assert_eq!(alice.header().message_number, 2);
    }

    #[test]
    fn test_dh_ratchet_rolls_counters() {
        let (mut alice, mut bob) = session();

        for message in [&b"one"[..], b"two", b"three"] {
            let (header, ciphertext) = alice.encrypt(message).unwrap();
            bob.decrypt(&header, &ciphertext).unwrap();
        }
        assert_eq!(bob.recv_count, 3);

        // Bob replies, which forces a DH ratchet on Alice's side.
        let (header, ciphertext) = bob.encrypt(b"reply").unwrap();
        assert_eq!(header.message_number, 0);
        alice.decrypt(&header, &ciphertext).unwrap();

        assert_eq!(alice.recv_count, 1);
        assert_eq!(alice.send_count, 0);
        assert_eq!(alice.previous_chain_length, 3);
    }

    #[test]
    fn test_out_of_order_uses_skipped_store() {
        let (mut alice, mut bob) = session();

        let (h0, c0) = alice.encrypt(b"zero").unwrap();
        let (h1, c1) = alice.encrypt(b"one").unwrap();
        let (h2, c2) = alice.encrypt(b"two").unwrap();

        assert_eq!(bob.decrypt(&h2, &c2).unwrap(), b"two");
        assert_eq!(bob.skipped_key_count(), 2);

        assert_eq!(bob.decrypt(&h0, &c0).unwrap(), b"zero");
        assert_eq!(bob.decrypt(&h1, &c1).unwrap(), b"one");
        assert_eq!(bob.skipped_key_count(), 0);
    }

    #[test]
    fn test_skip_overflow_is_an_error() {
        let (mut alice, mut bob) = session();

        let mut last = None;
        for _ in 0..(MAX_SKIP + 2) {
            last = Some(alice.encrypt(b"burst").unwrap());
        }
        let (header, ciphertext) = last.unwrap();

        assert!(matches!(
            bob.decrypt(&header, &ciphertext),
            Err(RatchetboxError::SkipOverflow { .. })
        ));
    }

    #[test]
    fn test_message_key_tracks_last_operation() {
        let (mut alice, mut bob) = session();

        let (header, ciphertext) = alice.encrypt(b"traced").unwrap();
        let sender_key = alice.message_key().clone();

        bob.decrypt(&header, &ciphertext).unwrap();
        assert_eq!(bob.message_key().as_bytes(), sender_key.as_bytes());
    }

    #[test]
    fn test_ring_collects_receive_keys() {
        let (mut alice, mut bob) = session();
        let ring = bob.ring();

        let (header, ciphertext) = alice.encrypt(b"ringed").unwrap();
        bob.decrypt(&header, &ciphertext).unwrap();

        assert_eq!(ring.len(), 1);
        assert_eq!(
            ring.try_open(&ciphertext, header.message_number).unwrap(),
            b"ringed"
        );
    }

    #[test]
    fn test_set_ratchet_installs_policy() {
        let (mut alice, _) = session();
        alice.set_ratchet(1, 0, SecurityLevel::VeryLow);
        assert_eq!(alice.scrypt_n(), 8_192);

        assert!(!alice.should_ratchet());
        assert!(alice.should_ratchet());
    }

    #[test]
    fn test_tampered_message_fails_auth() {
        let (mut alice, mut bob) = session();

        let (header, mut ciphertext) = alice.encrypt(b"fragile").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;

        assert!(matches!(
            bob.decrypt(&header, &ciphertext),
            Err(RatchetboxError::DecryptAuth)
        ));
    }
}
