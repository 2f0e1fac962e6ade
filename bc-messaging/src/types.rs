// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::errors::Error;
use bc_primitives::Checksum;
use serde::{Deserialize, Serialize};

/// A single `name <address>` or bare-address recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Mailbox {
    pub fn new(address: impl Into<String>) -> Result<Self, Error> {
        let address = address.into();
        validate_address(&address)?;
        Ok(Mailbox { address, name: None })
    }
}

fn validate_address(address: &str) -> Result<(), Error> {
    if address.is_empty() {
        return Err(Error::FieldEmpty("address"));
    }
    let at_count = address.matches('@').count();
    if at_count != 1 || address.starts_with('@') || address.ends_with('@') {
        return Err(Error::InvalidMailbox(address.to_string()));
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Pending,
    Announced,
    Delivered,
    Failed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    /// Lowercase hex of SHA-256(content); the attachment sub-store key.
    pub sha256_hex: String,
    /// Base64 of MD5(content).
    pub md5_base64: String,
    pub magnet_url: String,
    pub size: u64,
}

/// Caller-supplied input to `send_message`/`reply`/`forward`.
#[derive(Clone, Debug)]
pub struct SendMessageInput {
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub cc: Vec<Mailbox>,
    pub bcc: Vec<Mailbox>,
    pub reply_to: Option<Mailbox>,
    pub subject: String,
    pub body: Vec<u8>,
    pub attachments: Vec<(String, String, Vec<u8>)>,
    pub in_reply_to: Option<String>,
    pub references: Vec<String>,
}

/// One stored copy of a message (sender copy, To/CC copy, or a per-BCC
/// copy), keyed by its own `block_id`. `message_id` is shared across every
/// copy of the same logical message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub message_id: String,
    pub block_id: String,
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub cc: Vec<Mailbox>,
    pub bcc: Vec<Mailbox>,
    pub reply_to: Option<Mailbox>,
    pub subject: String,
    pub date_created_ms: u64,
    pub in_reply_to: Option<String>,
    pub references: Vec<String>,
    pub resent_chain: Vec<ResentHeader>,
    pub primary_cbl_checksum: Checksum,
    pub attachments: Vec<Attachment>,
    pub read_by: Vec<String>,
    pub delivery_status: std::collections::HashMap<String, DeliveryStatus>,
    /// True for a per-BCC copy whose body was sealed with `RecipientKeys`
    /// before being handed to the block store as CBL payload bytes.
    pub is_encrypted: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResentHeader {
    pub resent_from: Mailbox,
    pub resent_to: Vec<Mailbox>,
    pub resent_date_ms: u64,
    pub resent_message_id: String,
}

/// Filter DSL for `query_inbox`: all fields optional, conjunctive.
#[derive(Clone, Debug, Default)]
pub struct InboxFilter {
    pub unread_only: bool,
    pub since_ms: Option<u64>,
    pub folder: Option<Folder>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Folder {
    Inbox,
    Sent,
}

pub fn addresses(mailboxes: &[Mailbox]) -> Vec<String> {
    mailboxes.iter().map(|m| m.address.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailbox_requires_exactly_one_at_sign() {
        assert!(Mailbox::new("a@x").is_ok());
        assert!(Mailbox::new("ax").is_err());
        assert!(Mailbox::new("a@b@x").is_err());
        assert!(Mailbox::new("").is_err());
    }
}
