//! Salted one-way password hashing.
//!
//! Stored format is `hex(salt)$hex(digest)` where the digest is a BLAKE3
//! keyed derivation over `salt || password` with a domain-separation
//! context. Verification recomputes the digest and compares in constant
//! time.

use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::error::CredentialsError;

// BLAKE3 KDF context for domain separation
const KDF_CONTEXT_PASSWORD: &str = "mangia 2025-11-02 password-hash-v1";

const SALT_SIZE: usize = 16;
const DIGEST_SIZE: usize = 32;

/// Hash a password with a freshly generated random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt);

    let digest = derive_digest(&salt, password);
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Verify a password against a stored `salt$digest` string.
///
/// Returns `Ok(false)` on a mismatch; `Err` only when the stored string
/// itself is malformed.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, CredentialsError> {
    let (salt_hex, digest_hex) = stored
        .split_once('$')
        .ok_or(CredentialsError::MalformedHash)?;

    let salt = hex::decode(salt_hex)?;
    let expected = hex::decode(digest_hex)?;
    if expected.len() != DIGEST_SIZE {
        return Err(CredentialsError::MalformedHash);
    }

    let actual = derive_digest(&salt, password);
    Ok(actual.ct_eq(&expected[..]).unwrap_u8() == 1)
}

fn derive_digest(salt: &[u8], password: &str) -> [u8; DIGEST_SIZE] {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT_PASSWORD);
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let hash = hasher.finalize();

    let mut digest = [0u8; DIGEST_SIZE];
    digest.copy_from_slice(&hash.as_bytes()[..DIGEST_SIZE]);
    digest
}
