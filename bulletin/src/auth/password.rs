//! Password and PIN hashing and verification.
//!
//! Both secrets are stored as Argon2id PHC strings, each with its own random salt.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::debug;

use crate::errors::Error;

/// Shortest accepted PIN.
pub const PIN_MIN_DIGITS: usize = 4;
/// Longest accepted PIN.
pub const PIN_MAX_DIGITS: usize = 6;

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    fn to_argon2(self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| Error::Internal {
            operation: format!("create argon2 params: {e}"),
        })?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    /// Argon2id RFC recommendations
    fn default() -> Self {
        Self {
            memory_kib: 19456, // 19 MB
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Hash a secret with a freshly generated salt.
pub fn hash_secret(secret: &str, params: Argon2Params) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = params.to_argon2()?.hash_password(secret.as_bytes(), &salt).map_err(|e| Error::Internal {
        operation: format!("hash secret: {e}"),
    })?;

    Ok(hash.to_string())
}

/// Check a candidate against a stored digest.
///
/// Parameters and salt come from the digest itself. A digest that does not parse never matches.
pub fn verify_secret(candidate: &str, digest: &str) -> bool {
    let parsed = match PasswordHash::new(digest) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Stored digest could not be parsed: {e}");
            return false;
        }
    };

    Argon2::default().verify_password(candidate.as_bytes(), &parsed).is_ok()
}

/// Hash on a blocking thread so the async runtime is not stalled by the key derivation.
pub async fn hash_secret_blocking(secret: String, params: Argon2Params) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || hash_secret(&secret, params))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn hashing task: {e}"),
        })?
}

/// Verify on a blocking thread.
pub async fn verify_secret_blocking(candidate: String, digest: String) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || verify_secret(&candidate, &digest))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn verification task: {e}"),
        })
}

/// A PIN must be 4 to 6 ASCII digits.
pub fn validate_pin(pin: &str) -> Result<(), Error> {
    if !(PIN_MIN_DIGITS..=PIN_MAX_DIGITS).contains(&pin.len()) {
        return Err(Error::BadRequest {
            message: "PIN must be between 4 and 6 digits long.".to_string(),
        });
    }
    if !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::BadRequest {
            message: "PIN must consist of 4 to 6 digits only.".to_string(),
        });
    }
    Ok(())
}
