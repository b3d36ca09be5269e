//! Salted SHA-256 password hashing.
//!
//! Stored hashes have the form `hex(salt):hex(digest)` where the digest is
//! `SHA-256(salt || utf8(password))` computed in a single digest context.
//! The construction is fixed so hashes written by earlier installs keep
//! verifying.

use ring::digest::{self, Context};
use ring::rand::{SecureRandom, SystemRandom};
use subtle::ConstantTimeEq;

use crate::error::{StoreError, StoreResult};

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Separator between the hex salt and the hex digest.
const SEPARATOR: char = ':';

static DIGEST_ALG: &digest::Algorithm = &digest::SHA256;

/// Hash `password` with a fresh random salt.
///
/// # Errors
///
/// Returns [`StoreError::Crypto`] if the system random source is unavailable.
pub fn hash(password: &str) -> StoreResult<String> {
    let rng = SystemRandom::new();

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| StoreError::Crypto("failed to generate random salt".into()))?;

    let digest = salted_digest(&salt, password);
    Ok(format!(
        "{}{SEPARATOR}{}",
        hex::encode(salt),
        hex::encode(digest.as_ref())
    ))
}

/// Check `password` against a stored `hex(salt):hex(digest)` string.
///
/// Malformed input of any kind yields `false`. The digest comparison runs
/// in constant time.
pub fn verify(password: &str, stored: &str) -> bool {
    let mut parts = stored.split(SEPARATOR);
    let (Some(salt_hex), Some(digest_hex), None) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        return false;
    };

    let actual = salted_digest(&salt, password);
    actual.as_ref().ct_eq(&expected).into()
}

/// Hash and verify a probe password.
///
/// Run once at startup: a failure means the crypto primitives are not
/// usable and nothing can register or log in.
pub fn self_test() -> StoreResult<()> {
    let probe = "gymtracker-self-test";
    let stored = hash(probe)?;
    if !verify(probe, &stored) || verify("gymtracker-self-test-wrong", &stored) {
        return Err(StoreError::Crypto(
            "password hasher self-test produced inconsistent results".into(),
        ));
    }
    tracing::debug!("password hasher self-test passed");
    Ok(())
}

fn salted_digest(salt: &[u8], password: &str) -> digest::Digest {
    let mut ctx = Context::new(DIGEST_ALG);
    ctx.update(salt);
    ctx.update(password.as_bytes());
    ctx.finish()
}

// ── tests ────────────────────────────────────────────────────────────
