// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use bc_primitives::Checksum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementKind {
    Add,
    Remove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
}

/// `messageDelivery` payload attached to announcements that carry a message,
/// per §4.10/§6. Announcements without this field are pure block gossip and
/// MUST NOT drive inbox indexing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDelivery {
    pub message_id: String,
    pub recipient_ids: Vec<String>,
    pub priority: Priority,
    pub block_ids: Vec<Checksum>,
    pub cbl_block_id: Checksum,
    pub ack_required: bool,
}

/// A tagged gossip record: `{type: 'add'|'remove', blockId, nodeId,
/// timestamp, ttl, messageDelivery?}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
    pub block_id: Checksum,
    pub node_id: String,
    pub timestamp_ms: u64,
    pub ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_delivery: Option<MessageDelivery>,
}

impl Announcement {
    /// The set of recipient addresses this announcement carries, or empty
    /// for pure block gossip.
    pub fn recipient_ids(&self) -> &[String] {
        self.message_delivery
            .as_ref()
            .map(|d| d.recipient_ids.as_slice())
            .unwrap_or(&[])
    }
}
