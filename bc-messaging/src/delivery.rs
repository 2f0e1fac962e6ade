// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::types::{DeliveryStatus, MessageMetadata};
use bc_gossip::Announcement;
use std::collections::HashSet;

/// Pure function form of §4.13's inbound indexing: does `announcement`
/// address a local identity, and if so, what should be indexed?
///
/// Returns `None` when the announcement carries no `messageDelivery`, or
/// when none of its recipients are local — in either case nothing is
/// indexed, per spec.
pub fn should_index<'a>(announcement: &'a Announcement, local_addresses: &HashSet<String>) -> Option<&'a bc_gossip::MessageDelivery> {
    let delivery = announcement.message_delivery.as_ref()?;
    let matches = delivery.recipient_ids.iter().any(|id| local_addresses.contains(id));
    matches.then_some(delivery)
}

/// Inserts `copy` into `metadata`, keyed by message id. Idempotent: a copy
/// with a `block_id` already present under that message id is not
/// duplicated, so replaying the same announcement twice indexes once.
pub fn index_copy(metadata: &mut std::collections::HashMap<String, Vec<MessageMetadata>>, copy: MessageMetadata) {
    let entries = metadata.entry(copy.message_id.clone()).or_default();
    if !entries.iter().any(|existing| existing.block_id == copy.block_id) {
        entries.push(copy);
    }
}

/// Applies a delivery acknowledgment: `Pending -> Announced -> Delivered`,
/// or `Pending -> Failed` on permanent error. Keyed by recipient address.
pub fn apply_ack(copy: &mut MessageMetadata, recipient_address: &str, failed: bool) {
    let status = copy
        .delivery_status
        .entry(recipient_address.to_string())
        .or_insert(DeliveryStatus::Pending);
    *status = match (*status, failed) {
        (_, true) => DeliveryStatus::Failed,
        (DeliveryStatus::Pending, false) => DeliveryStatus::Announced,
        (DeliveryStatus::Announced, false) => DeliveryStatus::Delivered,
        (other, false) => other,
    };
}
