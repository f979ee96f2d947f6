//! Password based encryption of private note payloads
//!
//! A key is derived with PBKDF2-HMAC-SHA256 from the password and a fresh 16 byte salt, the
//! serialized payload is sealed with AES-256-GCM under a fresh 12 byte nonce. The tag is appended
//! to the ciphertext, the same layout `SubtleCrypto` produces, so blobs stay portable.
//!
//! Decryption never tells why it failed.

use aes_gcm::Aes256Gcm;
use aes_gcm::KeyInit;
use aes_gcm::Nonce;
use aes_gcm::aead::Aead;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand_core::OsRng;
use rand_core::RngCore;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use thiserror::Error;

/// Length of the PBKDF2 salt
pub const SALT_LEN: usize = 16;

/// Length of the AES-GCM nonce
pub const NONCE_LEN: usize = 12;

/// Length of the AES-256 key
pub const KEY_LEN: usize = 32;

/// PBKDF2 rounds unless configured otherwise
pub const DEFAULT_ITERATIONS: u32 = 120_000;

/// Fewer PBKDF2 rounds are never used
pub const MIN_ITERATIONS: u32 = 100_000;

/// Crypto errors
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The payload could not be sealed
    #[error("Encryption failed")]
    Encryption,

    /// Wrong password, tampered or malformed blob
    #[error("Decryption failed")]
    Decryption,
}

/// Result type for all crypto operations
pub type Result<T> = core::result::Result<T, Error>;

/// Encrypted payload as stored, all fields base64
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    /// Ciphertext with the authentication tag appended
    pub cipher: String,

    /// Nonce
    pub iv: String,

    /// PBKDF2 salt
    pub salt: String,
}

/// Seals and opens payloads with a fixed PBKDF2 work factor
///
/// The work factor is not stored in the blob, blobs only open with the count they were sealed
/// with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Crypto {
    iterations: u32,
}

impl Default for Crypto {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl Crypto {
    /// Create with a PBKDF2 round count, raised to [`MIN_ITERATIONS`] when lower
    pub fn new(iterations: u32) -> Self {
        if iterations < MIN_ITERATIONS {
            tracing::warn!(
                "KDF iterations {iterations} below minimum, using {MIN_ITERATIONS} instead"
            );
        }

        Self {
            iterations: iterations.max(MIN_ITERATIONS),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Encrypt any serializable payload with a password
    ///
    /// Key derivation runs on the blocking pool
    pub async fn encrypt<T>(&self, payload: &T, password: &str) -> Result<EncryptedBlob>
    where
        T: Serialize + ?Sized,
    {
        let plaintext = serde_json::to_vec(payload).map_err(|_| Error::Encryption)?;
        let password = password.to_string();
        let iterations = self.iterations;

        tokio::task::spawn_blocking(move || seal(&plaintext, &password, iterations))
            .await
            .map_err(|_| Error::Encryption)?
    }

    /// Decrypt a blob back into its payload
    pub async fn decrypt<T>(&self, blob: &EncryptedBlob, password: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let blob = blob.clone();
        let password = password.to_string();
        let iterations = self.iterations;

        let plaintext = tokio::task::spawn_blocking(move || open(&blob, &password, iterations))
            .await
            .map_err(|_| Error::Decryption)??;

        serde_json::from_slice(&plaintext).map_err(|_| Error::Decryption)
    }
}

/// Derive the AES key from a password and salt
fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

/// Seal plaintext bytes, blocking
pub fn seal(plaintext: &[u8], password: &str, iterations: u32) -> Result<EncryptedBlob> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut iv = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut iv);

    let key = derive_key(password, &salt, iterations);
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| Error::Encryption)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|_| Error::Encryption)?;

    Ok(EncryptedBlob {
        cipher: STANDARD.encode(ciphertext),
        iv: STANDARD.encode(iv),
        salt: STANDARD.encode(salt),
    })
}

/// Open a blob into plaintext bytes, blocking
pub fn open(blob: &EncryptedBlob, password: &str, iterations: u32) -> Result<Vec<u8>> {
    let salt = STANDARD.decode(&blob.salt).map_err(|_| Error::Decryption)?;
    let iv = STANDARD.decode(&blob.iv).map_err(|_| Error::Decryption)?;
    let ciphertext = STANDARD.decode(&blob.cipher).map_err(|_| Error::Decryption)?;

    if iv.len() != NONCE_LEN {
        return Err(Error::Decryption);
    }

    let key = derive_key(password, &salt, iterations);
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| Error::Decryption)?;

    cipher
        .decrypt(Nonce::from_slice(&iv), ciphertext.as_ref())
        .map_err(|_| Error::Decryption)
}
