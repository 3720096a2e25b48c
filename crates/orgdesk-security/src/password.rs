//! Password hashing using Argon2.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use orgdesk_core::{Interface, OrgdeskError, OrgdeskResult};
use shaku::Component;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Interface for password hashing operations.
pub trait PasswordHasherInterface: Interface + Send + Sync {
    /// Hashes a password with a fresh salt.
    fn hash(&self, password: &str) -> OrgdeskResult<String>;

    /// Verifies a password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> OrgdeskResult<bool>;

    /// Runs one verification against a throwaway hash, so that rejecting an
    /// unknown account costs as much as rejecting a wrong password.
    fn verify_dummy(&self, password: &str) -> OrgdeskResult<()>;
}

/// Password hasher service using Argon2id.
#[derive(Component, Clone)]
#[shaku(interface = PasswordHasherInterface)]
pub struct PasswordHasher {
    argon2: Arc<Argon2<'static>>,
    /// Hashed on first use with the same parameters as real hashes.
    dummy_hash: Arc<OnceLock<String>>,
}

impl PasswordHasher {
    /// Creates a new password hasher with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(Params::DEFAULT)
    }

    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Arc::new(Argon2::new(Algorithm::Argon2id, Version::V0x13, params)),
            dummy_hash: Arc::default(),
        }
    }

    /// Creates a password hasher from a memory cost in MiB.
    #[must_use]
    pub fn with_cost(cost: u32) -> Self {
        let params = Params::new(
            cost.saturating_mul(1024),
            Params::DEFAULT_T_COST,
            Params::DEFAULT_P_COST,
            None,
        )
        .unwrap_or(Params::DEFAULT);

        Self::with_params(params)
    }

    /// Converts into the parameters of the DI component.
    #[must_use]
    pub fn into_parameters(self) -> PasswordHasherParameters {
        PasswordHasherParameters {
            argon2: self.argon2,
            dummy_hash: self.dummy_hash,
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasherInterface for PasswordHasher {
    fn hash(&self, password: &str) -> OrgdeskResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| OrgdeskError::internal(format!("Failed to hash password: {e}")))?;

        debug!("Password hashed successfully");
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> OrgdeskResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| OrgdeskError::internal(format!("Invalid password hash format: {e}")))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Password verification failed: incorrect password");
                Ok(false)
            }
            Err(e) => Err(OrgdeskError::internal(format!("Password verification error: {e}"))),
        }
    }

    fn verify_dummy(&self, password: &str) -> OrgdeskResult<()> {
        let hash = match self.dummy_hash.get() {
            Some(hash) => hash,
            None => {
                let hash = self.hash("orgdesk-unused-password")?;
                self.dummy_hash.get_or_init(|| hash)
            }
        };
        self.verify(password, hash)?;
        Ok(())
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_cost(1)
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("secret123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("secret123", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_salts() {
        let hasher = fast_hasher();
        assert_ne!(hasher.hash("secret123").unwrap(), hasher.hash("secret123").unwrap());
    }

    #[test]
    fn test_dummy_verification_reuses_one_hash() {
        let hasher = fast_hasher();
        hasher.verify_dummy("anything").unwrap();
        let first = hasher.dummy_hash.get().cloned().unwrap();
        assert!(first.starts_with("$argon2id$"));

        hasher.verify_dummy("something else").unwrap();
        assert_eq!(hasher.dummy_hash.get(), Some(&first));
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let err = fast_hasher().verify("secret123", "plain-text").unwrap_err();
        assert!(err.is_internal());
    }
}
