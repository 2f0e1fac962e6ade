// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("encryption scheme requires keys that were not supplied")]
    EncryptionRequiresKeys,
    #[error("decryption failed: auth tag mismatch or missing recipient entry")]
    DecryptionFailed,
    #[error("signature verification failed")]
    SignatureInvalid,
    #[error("no recipient entry for address {0}")]
    UnknownRecipient(String),
    #[error(transparent)]
    Keyring(#[from] bc_keyring::Error),
}
