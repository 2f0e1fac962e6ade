// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::entry::{self, KeyringEntry};
use crate::errors::Error;
use hmac::{Hmac, Mac};
use parking_lot::RwLock;
use sha2::Sha512;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

type HmacSha512 = Hmac<Sha512>;

const DEFAULT_MAX_ACCESS_RATE: u32 = 5;
const ACCESS_WINDOW_MS: i64 = 1000;

#[derive(Clone, Debug)]
pub enum KeyringConfig {
    Memory,
    File(PathBuf),
}

impl KeyringConfig {
    /// Resolves the on-disk keyring path, honoring the `KEYRING_PATH`
    /// environment variable override when no explicit path is given.
    pub fn resolve() -> KeyringConfig {
        match std::env::var("KEYRING_PATH") {
            Ok(path) if !path.is_empty() => KeyringConfig::File(PathBuf::from(path)),
            _ => KeyringConfig::File(PathBuf::from("brightchain-keyring.json")),
        }
    }
}

struct AccessWindow {
    timestamps_ms: Vec<i64>,
}

/// Encrypted on-disk store of node secrets, keyed by id. Each entry is
/// encrypted under its own caller-supplied password; the keyring itself
/// holds no master passphrase.
pub struct Keyring {
    config: KeyringConfig,
    entries: Arc<RwLock<HashMap<String, KeyringEntry>>>,
    access_log: Arc<RwLock<HashMap<String, AccessWindow>>>,
    max_access_rate: u32,
}

impl Keyring {
    pub fn new(config: KeyringConfig) -> Result<Self, Error> {
        let entries = match &config {
            KeyringConfig::Memory => HashMap::new(),
            KeyringConfig::File(path) => load_from_disk(path)?,
        };
        Ok(Keyring {
            config,
            entries: Arc::new(RwLock::new(entries)),
            access_log: Arc::new(RwLock::new(HashMap::new())),
            max_access_rate: DEFAULT_MAX_ACCESS_RATE,
        })
    }

    pub fn with_max_access_rate(mut self, max_access_rate: u32) -> Self {
        self.max_access_rate = max_access_rate;
        self
    }

    pub fn put(&self, id: &str, password: &str, secret: &[u8], now_ms: i64) -> Result<(), Error> {
        if self.entries.read().contains_key(id) {
            return Err(Error::KeyExists(id.to_string()));
        }
        let (encrypted_data, iv, salt) = entry::encrypt(password, secret)?;
        let entry = KeyringEntry {
            id: id.to_string(),
            version: 1,
            encrypted_data,
            iv,
            salt,
            created_ms: now_ms,
            last_accessed_ms: None,
        };
        self.entries.write().insert(id.to_string(), entry);
        self.persist()
    }

    pub fn get(&self, id: &str, password: &str, now_ms: i64) -> Result<Vec<u8>, Error> {
        self.check_rate_limit(id, now_ms)?;
        let secret = {
            let entries = self.entries.read();
            let entry = entries.get(id).ok_or_else(|| Error::KeyNotFound(id.to_string()))?;
            entry::decrypt(password, &entry.encrypted_data, &entry.iv, &entry.salt)?
        };
        if let Some(entry) = self.entries.write().get_mut(id) {
            entry.last_accessed_ms = Some(now_ms);
        }
        self.persist()?;
        Ok(secret)
    }

    pub fn remove(&self, id: &str) -> Result<(), Error> {
        if self.entries.write().remove(id).is_none() {
            return Err(Error::KeyNotFound(id.to_string()));
        }
        self.persist()
    }

    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn check_rate_limit(&self, id: &str, now_ms: i64) -> Result<(), Error> {
        let mut log = self.access_log.write();
        let window = log.entry(id.to_string()).or_insert_with(|| AccessWindow { timestamps_ms: Vec::new() });
        window.timestamps_ms.retain(|ts| now_ms - ts < ACCESS_WINDOW_MS);
        if window.timestamps_ms.len() as u32 >= self.max_access_rate {
            return Err(Error::RateLimitExceeded(id.to_string()));
        }
        window.timestamps_ms.push(now_ms);
        Ok(())
    }

    fn persist(&self) -> Result<(), Error> {
        let KeyringConfig::File(path) = &self.config else {
            return Ok(());
        };
        let entries: Vec<KeyringEntry> = self.entries.read().values().cloned().collect();
        let json = entry::write_wire_pairs(&entries)?;
        std::fs::write(path, json)?;
        set_owner_only_perms(path)?;
        Ok(())
    }
}

fn load_from_disk(path: &PathBuf) -> Result<HashMap<String, KeyringEntry>, Error> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let json = std::fs::read_to_string(path)?;
    if json.trim().is_empty() {
        return Ok(HashMap::new());
    }
    let entries = entry::read_wire_pairs(&json)?;
    Ok(entries.into_iter().map(|e| (e.id.clone(), e)).collect())
}

#[cfg(unix)]
fn set_owner_only_perms(path: &PathBuf) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only_perms(_path: &PathBuf) -> Result<(), Error> {
    Ok(())
}

/// Signs a `"nodeId:timestamp"` auth challenge with HMAC-SHA512, per the
/// transport auth scheme's signature primitive.
pub fn sign_auth_challenge(secret_key: &[u8], node_id: &str, timestamp_ms: i64) -> [u8; 64] {
    let message = format!("{}:{}", node_id, timestamp_ms);
    let mut mac = HmacSha512::new_from_slice(secret_key).expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 64];
    out.copy_from_slice(&result);
    out
}

/// Verifies a `sign_auth_challenge` signature.
pub fn verify_auth_challenge(secret_key: &[u8], node_id: &str, timestamp_ms: i64, signature: &[u8; 64]) -> bool {
    let expected = sign_auth_challenge(secret_key, node_id, timestamp_ms);
    bc_primitives::eq_ct(&expected, signature)
}
