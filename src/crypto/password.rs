//! Passphrase-based key derivation for bootstrap secrets.
//!
//! Sessions start from a shared symmetric key; when that key comes from a
//! passphrase it is stretched here with scrypt. The work factor is fixed at
//! interactive-login grade and is independent of the per-session chain KDF
//! level.

use scrypt::{scrypt, Params};
use zeroize::Zeroizing;

use crate::crypto::KEY_SIZE;
use crate::error::{RatchetboxError, Result};

/// scrypt work factor for passphrase-derived keys.
const PASSWORD_SCRYPT_N: u32 = 32_768;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

/// Derives a symmetric key from a passphrase and salt.
pub fn password_key(password: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let params = Params::new(
        PASSWORD_SCRYPT_N.trailing_zeros() as u8,
        SCRYPT_R,
        SCRYPT_P,
        KEY_SIZE,
    )
    .map_err(RatchetboxError::kdf)?;

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    scrypt(password, salt, &params, key.as_mut_slice()).map_err(RatchetboxError::kdf)?;
    Ok(key)
}
