// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Validation
    #[error("field '{0}' is required")]
    FieldRequired(&'static str),
    #[error("field '{0}' must not be empty")]
    FieldEmpty(&'static str),
    #[error("invalid mailbox address: {0}")]
    InvalidMailbox(String),
    #[error("invalid message id: {0}")]
    InvalidMessageId(String),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("message must have at least one recipient across to/cc/bcc")]
    NoRecipients,

    // Storage
    #[error("message not found: {0}")]
    NotFound(String),
    #[error("attachment content missing for key {0}")]
    AttachmentMissing(String),

    // Delegated
    #[error(transparent)]
    Store(#[from] bc_store::Error),
    #[error(transparent)]
    Crypto(#[from] bc_crypto::Error),
    #[error(transparent)]
    Gossip(#[from] bc_gossip::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
