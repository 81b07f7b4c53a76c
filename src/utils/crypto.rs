// Encryption of stored user data, one-way hashing and random tokens

use aes_gcm::{
    aead::{consts::U16, generic_array::GenericArray, Aead, KeyInit, Payload},
    aes::Aes256,
    AesGcm,
};
use anyhow::{anyhow, bail, Context, Result};
use argon2::Argon2;
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};

/// AES-256-GCM with a 128-bit IV
type Aes256Gcm16 = AesGcm<Aes256, U16>;

pub const ENCRYPTION_KEY_SIZE: usize = 32;
pub const IV_SIZE: usize = 16;
pub const TAG_SIZE: usize = 16;

/// Bound into every ciphertext as additional authenticated data
const AAD: &[u8] = b"home-loan-helper";

/// Salt used when deriving a key from a passphrase
const KEY_DERIVATION_SALT: &[u8] = b"home-loan-helper-key-derivation";

const HASH_SIZE: usize = 64;

/// Symmetric encryption for data at rest
#[derive(Clone)]
pub struct EncryptionService {
    key: [u8; ENCRYPTION_KEY_SIZE],
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService").finish_non_exhaustive()
    }
}

impl EncryptionService {
    /// Build the service from a configured key.
    ///
    /// A key that base64-decodes to exactly 32 bytes is used directly. Anything
    /// else is treated as a passphrase and stretched with Argon2id.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or key derivation fails
    pub fn new(encryption_key: &str) -> Result<Self> {
        if encryption_key.is_empty() {
            bail!("Encryption key is required");
        }

        let mut key = [0u8; ENCRYPTION_KEY_SIZE];
        match general_purpose::STANDARD.decode(encryption_key) {
            Ok(bytes) if bytes.len() == ENCRYPTION_KEY_SIZE => key.copy_from_slice(&bytes),
            _ => {
                Argon2::default()
                    .hash_password_into(encryption_key.as_bytes(), KEY_DERIVATION_SALT, &mut key)
                    .map_err(|e| anyhow!("Key derivation failed: {e}"))?;
            }
        }

        Ok(Self { key })
    }

    /// Encrypt a string, returning base64 of `iv || ciphertext || tag`
    ///
    /// # Errors
    ///
    /// Returns an error if AES encryption fails
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut iv = [0u8; IV_SIZE];
        rand::rng().fill_bytes(&mut iv);

        let ciphertext = self
            .cipher()?
            .encrypt(
                GenericArray::from_slice(&iv),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: AAD,
                },
            )
            .map_err(|e| anyhow!("AES encryption failed: {e}"))?;

        let mut combined = Vec::with_capacity(IV_SIZE + ciphertext.len());
        combined.extend_from_slice(&iv);
        combined.extend_from_slice(&ciphertext);
        Ok(general_purpose::STANDARD.encode(combined))
    }

    /// Reverse of [`EncryptionService::encrypt`]
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid base64, is too short, was
    /// tampered with, or was encrypted under another key
    pub fn decrypt(&self, encrypted_data: &str) -> Result<String> {
        let combined = general_purpose::STANDARD
            .decode(encrypted_data)
            .context("Encrypted data is not valid base64")?;

        if combined.len() < IV_SIZE + TAG_SIZE {
            bail!("Encrypted data too short");
        }

        let (iv, ciphertext) = combined.split_at(IV_SIZE);
        let plaintext = self
            .cipher()?
            .decrypt(
                GenericArray::from_slice(iv),
                Payload {
                    msg: ciphertext,
                    aad: AAD,
                },
            )
            .map_err(|e| anyhow!("AES decryption failed: {e}"))?;

        String::from_utf8(plaintext).context("Decrypted data is not valid UTF-8")
    }

    /// # Errors
    ///
    /// Returns an error if serialization or encryption fails
    pub fn encrypt_json<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = serde_json::to_string(data).context("Failed to serialize data")?;
        self.encrypt(&json)
    }

    /// # Errors
    ///
    /// Returns an error if decryption or deserialization fails
    pub fn decrypt_json<T: DeserializeOwned>(&self, encrypted_data: &str) -> Result<T> {
        let json = self.decrypt(encrypted_data)?;
        serde_json::from_str(&json).context("Failed to deserialize decrypted data")
    }

    /// One-way hash in `salt:hash` form. A random 16 byte hex salt is used when none is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the salt is shorter than 8 bytes
    pub fn hash(&self, data: &str, salt: Option<&str>) -> Result<String> {
        let salt = salt.map_or_else(|| generate_token(16), ToString::to_string);
        let digest = argon2_digest(data, &salt)?;
        Ok(format!("{salt}:{digest}"))
    }

    /// Check `data` against a value produced by [`EncryptionService::hash`]
    #[must_use]
    pub fn verify_hash(&self, data: &str, hashed_data: &str) -> bool {
        let Some((salt, expected)) = hashed_data.split_once(':') else {
            return false;
        };
        argon2_digest(data, salt).is_ok_and(|digest| digest == expected)
    }

    fn cipher(&self) -> Result<Aes256Gcm16> {
        Aes256Gcm16::new_from_slice(&self.key).map_err(|e| anyhow!("Invalid key length: {e}"))
    }
}

fn argon2_digest(data: &str, salt: &str) -> Result<String> {
    let mut output = [0u8; HASH_SIZE];
    Argon2::default()
        .hash_password_into(data.as_bytes(), salt.as_bytes(), &mut output)
        .map_err(|e| anyhow!("Hashing failed: {e}"))?;
    Ok(hex::encode(output))
}

/// Random hex token of `length` bytes (`2 * length` characters)
#[must_use]
pub fn generate_token(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 32 random bytes, standard base64; accepted as-is by [`EncryptionService::new`]
#[must_use]
pub fn generate_encryption_key() -> String {
    let mut key = [0u8; 32];
    rand::rng().fill_bytes(&mut key);
    general_purpose::STANDARD.encode(key)
}

/// 32 random bytes, base64url without padding
#[must_use]
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// 24 random bytes, base64url without padding
#[must_use]
pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; 24];
    rand::rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
