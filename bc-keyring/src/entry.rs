// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::errors::Error;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use rand::RngCore;
use scrypt::Params;
use serde::{Deserialize, Serialize};

pub const IV_LEN: usize = 16;
pub const SALT_LEN: usize = 32;
const GCM_NONCE_LEN: usize = 12;

/// One decrypted keyring entry, held only in memory. Never serialized directly.
#[derive(Clone, Debug)]
pub struct KeyringEntry {
    pub id: String,
    pub version: u32,
    pub encrypted_data: Vec<u8>,
    pub iv: Vec<u8>,
    pub salt: Vec<u8>,
    pub created_ms: i64,
    pub last_accessed_ms: Option<i64>,
}

/// On-disk shape of one entry: `{id, version, encryptedData, iv, salt,
/// created, lastAccessed?}` per spec, with binary fields base64-encoded.
#[derive(Serialize, Deserialize)]
struct KeyringEntryWire {
    id: String,
    version: u32,
    #[serde(rename = "encryptedData")]
    encrypted_data: String,
    iv: String,
    salt: String,
    created: i64,
    #[serde(rename = "lastAccessed", skip_serializing_if = "Option::is_none")]
    last_accessed: Option<i64>,
}

impl From<&KeyringEntry> for KeyringEntryWire {
    fn from(entry: &KeyringEntry) -> Self {
        KeyringEntryWire {
            id: entry.id.clone(),
            version: entry.version,
            encrypted_data: BASE64_STANDARD.encode(&entry.encrypted_data),
            iv: BASE64_STANDARD.encode(&entry.iv),
            salt: BASE64_STANDARD.encode(&entry.salt),
            created: entry.created_ms,
            last_accessed: entry.last_accessed_ms,
        }
    }
}

impl TryFrom<KeyringEntryWire> for KeyringEntry {
    type Error = Error;

    fn try_from(wire: KeyringEntryWire) -> Result<Self, Error> {
        Ok(KeyringEntry {
            id: wire.id,
            version: wire.version,
            encrypted_data: BASE64_STANDARD
                .decode(&wire.encrypted_data)
                .map_err(|e| Error::InvalidEntry(e.to_string()))?,
            iv: BASE64_STANDARD
                .decode(&wire.iv)
                .map_err(|e| Error::InvalidEntry(e.to_string()))?,
            salt: BASE64_STANDARD
                .decode(&wire.salt)
                .map_err(|e| Error::InvalidEntry(e.to_string()))?,
            created_ms: wire.created,
            last_accessed_ms: wire.last_accessed,
        })
    }
}

/// One `[id, entry]` pair as stored in the on-disk JSON array.
pub fn to_wire_pair(entry: &KeyringEntry) -> (String, KeyringEntryWire) {
    (entry.id.clone(), KeyringEntryWire::from(entry))
}

pub fn read_wire_pairs(json: &str) -> Result<Vec<KeyringEntry>, Error> {
    let pairs: Vec<(String, KeyringEntryWire)> = serde_json::from_str(json)?;
    pairs.into_iter().map(|(_, wire)| KeyringEntry::try_from(wire)).collect()
}

pub fn write_wire_pairs(entries: &[KeyringEntry]) -> Result<String, Error> {
    let pairs: Vec<(String, KeyringEntryWire)> = entries.iter().map(to_wire_pair).collect();
    Ok(serde_json::to_string_pretty(&pairs)?)
}

fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; 32], Error> {
    let params = Params::new(14, 8, 1, 32).map_err(|_| Error::EncryptionFailed)?;
    let mut key = [0u8; 32];
    scrypt::scrypt(password.as_bytes(), salt, &params, &mut key).map_err(|_| Error::EncryptionFailed)?;
    Ok(key)
}

/// Encrypts `secret` under `password`, generating a fresh salt and IV.
/// Returns `(encrypted_data_with_tag, iv, salt)`.
pub fn encrypt(password: &str, secret: &[u8]) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>), Error> {
    let mut salt = vec![0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut iv = vec![0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let key_bytes = derive_key(password, &salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    let nonce = Nonce::from_slice(&iv[..GCM_NONCE_LEN]);
    let ciphertext = cipher
        .encrypt(nonce, secret)
        .map_err(|_| Error::EncryptionFailed)?;

    Ok((ciphertext, iv, salt))
}

/// Recovers the plaintext secret from an entry's ciphertext, given its salt/IV.
pub fn decrypt(password: &str, encrypted_data: &[u8], iv: &[u8], salt: &[u8]) -> Result<Vec<u8>, Error> {
    if iv.len() < GCM_NONCE_LEN {
        return Err(Error::InvalidEntry("iv shorter than GCM nonce length".to_string()));
    }
    let key_bytes = derive_key(password, salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    let nonce = Nonce::from_slice(&iv[..GCM_NONCE_LEN]);
    cipher
        .decrypt(nonce, encrypted_data)
        .map_err(|_| Error::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_recovers_secret() {
        let (ciphertext, iv, salt) = encrypt("hunter2", b"super secret key material").unwrap();
        let plaintext = decrypt("hunter2", &ciphertext, &iv, &salt).unwrap();
        assert_eq!(plaintext, b"super secret key material");
    }

    #[test]
    fn wrong_password_fails_to_decrypt() {
        let (ciphertext, iv, salt) = encrypt("correct-password", b"secret").unwrap();
        assert!(matches!(
            decrypt("wrong-password", &ciphertext, &iv, &salt),
            Err(Error::DecryptionFailed)
        ));
    }

    #[test]
    fn each_encryption_uses_a_fresh_iv_and_salt() {
        let (_, iv1, salt1) = encrypt("p", b"secret").unwrap();
        let (_, iv2, salt2) = encrypt("p", b"secret").unwrap();
        assert_ne!(iv1, iv2);
        assert_ne!(salt1, salt2);
    }

    #[test]
    fn wire_round_trips_through_json() {
        let (encrypted_data, iv, salt) = encrypt("p", b"secret").unwrap();
        let entry = KeyringEntry {
            id: "node-1".to_string(),
            version: 1,
            encrypted_data,
            iv,
            salt,
            created_ms: 1700000000000,
            last_accessed_ms: None,
        };
        let json = write_wire_pairs(&[entry.clone()]).unwrap();
        assert!(json.contains("\"encryptedData\""));
        let decoded = read_wire_pairs(&json).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, entry.id);
        assert_eq!(decoded[0].encrypted_data, entry.encrypted_data);
    }
}
