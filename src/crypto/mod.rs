//! Cryptographic functions for checkdesk
//!
//! Argon2id password hashing for user accounts, and AES-256-GCM with
//! Argon2id key derivation for passphrase-protected backups.

pub mod encryption;
pub mod key_derivation;
pub mod password;

pub use encryption::{decrypt_with_passphrase, encrypt_with_passphrase, EncryptedData};
pub use key_derivation::{derive_key, DerivedKey, KeyDerivationParams};
pub use password::{hash_password, verify_password};
