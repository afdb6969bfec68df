//! Key derivation using Argon2id
//!
//! Turns a backup passphrase into a 256-bit AES key. The salt and cost
//! parameters travel with the encrypted file so it can be opened later.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, Params,
};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CheckdeskError, CheckdeskResult};

/// Parameters for key derivation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDerivationParams {
    /// Salt (base64, PHC encoding)
    pub salt: String,
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Iterations
    pub time_cost: u32,
    pub parallelism: u32,
}

impl KeyDerivationParams {
    /// Fresh parameters with a random salt (64 MiB, 3 passes, 4 lanes)
    pub fn new() -> Self {
        Self {
            salt: SaltString::generate(&mut OsRng).to_string(),
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }

    /// Cheap parameters for tests
    #[cfg(test)]
    pub fn fast() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            ..Self::new()
        }
    }
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self::new()
    }
}

/// A derived 32-byte key, wiped on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; 32],
}

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

/// Derive an encryption key from a passphrase
pub fn derive_key(passphrase: &str, params: &KeyDerivationParams) -> CheckdeskResult<DerivedKey> {
    let salt = SaltString::from_b64(&params.salt)
        .map_err(|e| CheckdeskError::Encryption(format!("Invalid salt: {}", e)))?;

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(32),
    )
    .map_err(|e| CheckdeskError::Encryption(format!("Invalid Argon2 parameters: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| CheckdeskError::Encryption(format!("Key derivation failed: {}", e)))?;

    let output = hash
        .hash
        .ok_or_else(|| CheckdeskError::Encryption("No hash output generated".to_string()))?;
    let bytes = output.as_bytes();
    if bytes.len() < 32 {
        return Err(CheckdeskError::Encryption(
            "Hash output too short for AES-256 key".to_string(),
        ));
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes[..32]);
    Ok(DerivedKey { key })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_passphrase_same_key() {
        let params = KeyDerivationParams::fast();
        let key1 = derive_key("backup passphrase", &params).unwrap();
        let key2 = derive_key("backup passphrase", &params).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_salt_changes_key() {
        let key1 = derive_key("backup passphrase", &KeyDerivationParams::fast()).unwrap();
        let key2 = derive_key("backup passphrase", &KeyDerivationParams::fast()).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_invalid_salt() {
        let mut params = KeyDerivationParams::fast();
        params.salt = "!".into();
        assert!(derive_key("x", &params).is_err());
    }
}
