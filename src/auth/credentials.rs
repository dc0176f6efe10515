//! Credential Verifier
//!
//! Checks a submitted username/password against the single configured
//! account. The password is only ever held as an Argon2 PHC hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use sha2::{Digest, Sha256};
use tracing::error;

/// Verifies login attempts for the configured account.
#[derive(Clone)]
pub struct CredentialVerifier {
    username: String,
    password_hash: String,
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl CredentialVerifier {
    /// Creates a verifier; fails if `password_hash` is not a PHC string.
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Result<Self, argon2::password_hash::Error> {
        let password_hash = password_hash.into();
        PasswordHash::new(&password_hash)?;
        Ok(Self {
            username: username.into(),
            password_hash,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns true only when both username and password match.
    ///
    /// The password hash is checked even when the username is wrong, so a
    /// caller cannot tell the two failures apart by timing.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let parsed = match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(error = %e, "configured password hash is unreadable");
                return false;
            }
        };

        let password_ok = Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();
        let username_ok = Sha256::digest(username.as_bytes())
            == Sha256::digest(self.username.as_bytes());

        username_ok && password_ok
    }
}

/// Hashes a password with Argon2id (m=19456, t=2, p=1) and a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let params = Params::new(19456, 2, 1, None)?;
    hash_password_with(password, params)
}

/// Hashes a password with explicit Argon2id parameters.
pub fn hash_password_with(
    password: &str,
    params: Params,
) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}
