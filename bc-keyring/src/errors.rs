// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no keyring entry for id {0}")]
    KeyNotFound(String),
    #[error("a keyring entry already exists for id {0}")]
    KeyExists(String),
    #[error("failed to encrypt keyring entry")]
    EncryptionFailed,
    #[error("failed to decrypt keyring entry, possibly a wrong password")]
    DecryptionFailed,
    #[error("access rate exceeded for id {0}")]
    RateLimitExceeded(String),
    #[error("malformed keyring entry: {0}")]
    InvalidEntry(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
