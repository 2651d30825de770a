use crate::error::{Error, Result};
use argon2::{Algorithm, Argon2, Params, PasswordVerifier, Version};
use password_hash::{PasswordHash, SaltString};

/// Password hashing contract
///
/// Implementations must use a deliberately slow, salted algorithm and a
/// constant-time verification — never a direct string comparison.
pub trait Hasher: Send + Sync {
    /// Hash a plaintext secret into a PHC string
    fn hash(&self, plaintext: &str) -> Result<String>;

    /// Verify a plaintext secret against a stored PHC hash
    fn verify(&self, plaintext: &str, hash: &str) -> bool;

    /// Whether the stored hash's embedded parameters differ from the
    /// currently configured ones, enabling opportunistic rehashing
    fn needs_rehash(&self, hash: &str) -> bool;
}

/// Argon2id hasher (the default)
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
    params: Params,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        let params = Params::default();
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone()),
            params,
        }
    }

    /// Custom cost parameters (memory KiB, iterations, parallelism)
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| Error::hash(format!("Invalid Argon2 params: {}", e)))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone()),
            params,
        })
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes)
            .map_err(|e| Error::hash(format!("Salt generation failed: {}", e)))?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| Error::hash(format!("Salt encoding failed: {}", e)))?;

        let phc = argon2::PasswordHasher::hash_password(&self.argon2, plaintext.as_bytes(), &salt)
            .map_err(|e| Error::hash(format!("Hashing failed: {}", e)))?
            .to_string();
        Ok(phc)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    fn needs_rehash(&self, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            // Unparseable hashes always want a rehash
            Err(_) => return true,
        };

        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }

        match Params::try_from(&parsed) {
            Ok(stored) => {
                stored.m_cost() != self.params.m_cost()
                    || stored.t_cost() != self.params.t_cost()
                    || stored.p_cost() != self.params.p_cost()
            }
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("secret").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("secret", &hash));
        assert!(!hasher.verify("wrong", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = Argon2Hasher::new();
        let a = hasher.hash("secret").unwrap();
        let b = hasher.hash("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_needs_rehash_on_param_change() {
        let weak = Argon2Hasher::with_params(8, 1, 1).unwrap();
        let hash = weak.hash("secret").unwrap();

        assert!(!weak.needs_rehash(&hash));
        let current = Argon2Hasher::new();
        assert!(current.needs_rehash(&hash));
        assert!(current.needs_rehash("not-a-phc-string"));
    }
}
