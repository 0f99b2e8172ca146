//! Salted password digests.

use sha2::{Digest, Sha256};

/// A salted SHA-256 password digest (hex encoded).
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    salt: String,
    digest: String,
}

impl PasswordHash {
    pub fn derive(salt: impl Into<String>, password: &str) -> Self {
        let salt = salt.into();
        let digest = digest(&salt, password);
        Self { salt, digest }
    }

    /// Rebuild from stored columns.
    pub fn from_parts(salt: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            salt: salt.into(),
            digest: digest.into(),
        }
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn verify(&self, password: &str) -> bool {
        let candidate = digest(&self.salt, password);
        constant_time_eq(candidate.as_bytes(), self.digest.as_bytes())
    }
}

impl core::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PasswordHash").finish_non_exhaustive()
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_only_the_original_password() {
        let hash = PasswordHash::derive("salt-1", "123456");
        assert!(hash.verify("123456"));
        assert!(!hash.verify("1234567"));
        assert!(!hash.verify(""));
    }

    #[test]
    fn salt_changes_the_digest() {
        let a = PasswordHash::derive("a", "secret");
        let b = PasswordHash::derive("b", "secret");
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn round_trips_through_stored_parts() {
        let hash = PasswordHash::derive("s", "pw-pw-pw");
        let restored = PasswordHash::from_parts(hash.salt(), hash.digest());
        assert!(restored.verify("pw-pw-pw"));
    }
}
