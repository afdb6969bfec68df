//! AES-256-GCM encryption of backup files
//!
//! An encrypted backup is a JSON document holding the key derivation
//! parameters, the nonce and the ciphertext, all base64-encoded.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{CheckdeskError, CheckdeskResult};

use super::key_derivation::{derive_key, DerivedKey, KeyDerivationParams};

/// Size of the AES-GCM nonce in bytes (96 bits)
const NONCE_SIZE: usize = 12;

/// Current envelope format
const FORMAT_VERSION: u8 = 1;

/// Self-describing encrypted payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedData {
    #[serde(default = "default_version")]
    pub version: u8,
    pub kdf: KeyDerivationParams,
    pub nonce: String,
    pub ciphertext: String,
}

fn default_version() -> u8 {
    FORMAT_VERSION
}

impl EncryptedData {
    fn decode(field: &str, value: &str) -> CheckdeskResult<Vec<u8>> {
        STANDARD
            .decode(value)
            .map_err(|e| CheckdeskError::Encryption(format!("Invalid {} encoding: {}", field, e)))
    }
}

fn cipher(key: &DerivedKey) -> CheckdeskResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CheckdeskError::Encryption(format!("Failed to create cipher: {}", e)))
}

/// Encrypt bytes with a key derived from `passphrase`
pub fn encrypt_with_passphrase(plaintext: &[u8], passphrase: &str) -> CheckdeskResult<EncryptedData> {
    encrypt_with_params(plaintext, passphrase, KeyDerivationParams::new())
}

pub(crate) fn encrypt_with_params(
    plaintext: &[u8],
    passphrase: &str,
    kdf: KeyDerivationParams,
) -> CheckdeskResult<EncryptedData> {
    if passphrase.is_empty() {
        return Err(CheckdeskError::Encryption("Passphrase cannot be empty".into()));
    }
    let key = derive_key(passphrase, &kdf)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let ciphertext = cipher(&key)?
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| CheckdeskError::Encryption(format!("Encryption failed: {}", e)))?;

    Ok(EncryptedData {
        version: FORMAT_VERSION,
        kdf,
        nonce: STANDARD.encode(nonce_bytes),
        ciphertext: STANDARD.encode(ciphertext),
    })
}

/// Decrypt a payload produced by [`encrypt_with_passphrase`]
pub fn decrypt_with_passphrase(encrypted: &EncryptedData, passphrase: &str) -> CheckdeskResult<Vec<u8>> {
    if encrypted.version != FORMAT_VERSION {
        return Err(CheckdeskError::Encryption(format!(
            "Unsupported encryption version: {}",
            encrypted.version
        )));
    }

    let nonce_bytes = EncryptedData::decode("nonce", &encrypted.nonce)?;
    if nonce_bytes.len() != NONCE_SIZE {
        return Err(CheckdeskError::Encryption(format!(
            "Invalid nonce size: expected {}, got {}",
            NONCE_SIZE,
            nonce_bytes.len()
        )));
    }
    let ciphertext = EncryptedData::decode("ciphertext", &encrypted.ciphertext)?;

    let key = derive_key(passphrase, &encrypted.kdf)?;
    cipher(&key)?
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|_| {
            CheckdeskError::Encryption("Decryption failed: wrong passphrase or corrupted data".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let plaintext = b"SQLite format 3\0 pretend database";
        let encrypted =
            encrypt_with_params(plaintext, "s3cret!", KeyDerivationParams::fast()).unwrap();
        assert_ne!(encrypted.ciphertext.as_bytes(), plaintext);

        let decrypted = decrypt_with_passphrase(&encrypted, "s3cret!").unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_passphrase() {
        let encrypted =
            encrypt_with_params(b"data", "right", KeyDerivationParams::fast()).unwrap();
        let err = decrypt_with_passphrase(&encrypted, "wrong").unwrap_err();
        assert!(err.to_string().contains("wrong passphrase"));
    }

    #[test]
    fn test_tampered_ciphertext() {
        let mut encrypted =
            encrypt_with_params(b"data", "right", KeyDerivationParams::fast()).unwrap();
        let mut raw = STANDARD.decode(&encrypted.ciphertext).unwrap();
        raw[0] ^= 0xff;
        encrypted.ciphertext = STANDARD.encode(raw);
        assert!(decrypt_with_passphrase(&encrypted, "right").is_err());
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        assert!(encrypt_with_params(b"data", "", KeyDerivationParams::fast()).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let encrypted =
            encrypt_with_params(b"data", "pw", KeyDerivationParams::fast()).unwrap();
        let json = serde_json::to_string(&encrypted).unwrap();
        let back: EncryptedData = serde_json::from_str(&json).unwrap();
        assert_eq!(decrypt_with_passphrase(&back, "pw").unwrap(), b"data");
    }
}
