// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::types::{addresses, Mailbox};
use bc_gossip::{Announcement, AnnouncementKind, MessageDelivery, Priority};
use bc_primitives::Checksum;

/// Builds the gossip announcement for the To/CC copy: one announcement
/// whose `recipientIds` is the union of To and CC addresses (§4.10 step 2).
pub fn to_cc_announcement(
    node_id: &str,
    now_ms: u64,
    block_id: Checksum,
    message_id: String,
    to: &[Mailbox],
    cc: &[Mailbox],
) -> Announcement {
    let recipient_ids = addresses(to).into_iter().chain(addresses(cc)).collect();
    build_announcement(node_id, now_ms, block_id, message_id, recipient_ids)
}

/// Builds the gossip announcement for a single BCC recipient's copy: one
/// announcement whose `recipientIds` contains only that recipient (§4.10
/// step 3) — the invariant that keeps BCC addresses from leaking.
pub fn per_bcc_announcement(
    node_id: &str,
    now_ms: u64,
    block_id: Checksum,
    message_id: String,
    recipient: &Mailbox,
) -> Announcement {
    build_announcement(node_id, now_ms, block_id, message_id, vec![recipient.address.clone()])
}

fn build_announcement(node_id: &str, now_ms: u64, block_id: Checksum, message_id: String, recipient_ids: Vec<String>) -> Announcement {
    Announcement {
        kind: AnnouncementKind::Add,
        block_id,
        node_id: node_id.to_string(),
        timestamp_ms: now_ms,
        ttl: 8,
        message_delivery: Some(MessageDelivery {
            message_id,
            recipient_ids: recipient_ids.clone(),
            priority: Priority::Normal,
            block_ids: vec![block_id],
            cbl_block_id: block_id,
            ack_required: true,
        }),
    }
}
