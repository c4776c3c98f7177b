//! Credential hashing: PBKDF2-HMAC-SHA256 with a per-password random salt.
//!
//! Encoded form: `pbkdf2-sha256$<iterations>$<b64 salt>$<b64 hash>`.
//! The iteration count travels with the hash so it can be raised later
//! without invalidating stored credentials.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::CryptoError;

const SCHEME: &str = "pbkdf2-sha256";

#[cfg(not(test))]
pub const PBKDF2_ITERATIONS: u32 = 600_000;
// Unoptimized test builds would spend seconds per hash at the production count.
#[cfg(test)]
pub const PBKDF2_ITERATIONS: u32 = 1_000;

pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Hash a plaintext password into its encoded, storable form.
pub fn hash_password(password: &str) -> String {
    hash_password_with(password, PBKDF2_ITERATIONS)
}

pub fn hash_password_with(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    let hash = derive(password, &salt, iterations);
    format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash.as_slice())
    )
}

/// Check a plaintext password against an encoded hash.
///
/// Malformed encodings verify as false; the comparison is constant-time.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    match decode(encoded) {
        Ok((iterations, salt, expected)) => {
            let actual = derive(password, &salt, iterations);
            actual.as_slice().ct_eq(expected.as_slice()).into()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Stored credential could not be decoded");
            false
        }
    }
}

/// Reject passwords too short to be worth hashing.
pub fn check_password_policy(password: &str) -> Result<(), CryptoError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CryptoError::WeakPassword(MIN_PASSWORD_LENGTH));
    }
    Ok(())
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; HASH_LENGTH]> {
    let mut out = Zeroizing::new([0u8; HASH_LENGTH]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, out.as_mut_slice());
    out
}

fn decode(encoded: &str) -> Result<(u32, Vec<u8>, Vec<u8>), CryptoError> {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(CryptoError::MalformedHash);
    };
    if scheme != SCHEME {
        return Err(CryptoError::MalformedHash);
    }
    let iterations: u32 = iterations.parse().map_err(|_| CryptoError::MalformedHash)?;
    if iterations == 0 {
        return Err(CryptoError::MalformedHash);
    }
    let salt = STANDARD_NO_PAD
        .decode(salt)
        .map_err(|_| CryptoError::MalformedHash)?;
    let hash = STANDARD_NO_PAD
        .decode(hash)
        .map_err(|_| CryptoError::MalformedHash)?;
    if hash.len() != HASH_LENGTH {
        return Err(CryptoError::MalformedHash);
    }
    Ok((iterations, salt, hash))
}
