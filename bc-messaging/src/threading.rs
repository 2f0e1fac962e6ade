// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::types::{Mailbox, MessageMetadata, ResentHeader};

pub const DEFAULT_MAX_REFERENCES_COUNT: usize = 20;

/// Builds the `In-Reply-To`/`References` pair for a reply to `parent`.
pub fn build_reply_headers(parent: &MessageMetadata, max_references_count: usize) -> (String, Vec<String>) {
    let in_reply_to = parent.message_id.clone();
    let mut references = parent.references.clone();
    references.push(parent.message_id.clone());
    if references.len() > max_references_count {
        let drop = references.len() - max_references_count;
        references.drain(0..drop);
    }
    (in_reply_to, references)
}

/// `reply_all` recipients: `parent.from ∪ parent.to ∪ parent.cc`, minus the
/// replier, deduplicated by address. `reply-to` overrides `from` when the
/// parent declared one.
pub fn reply_all_recipients(parent: &MessageMetadata, replier_address: &str) -> Vec<Mailbox> {
    let from = parent.reply_to.clone().unwrap_or_else(|| parent.from.clone());
    let mut seen = std::collections::HashSet::new();
    let mut recipients = Vec::new();
    for mailbox in std::iter::once(from).chain(parent.to.clone()).chain(parent.cc.clone()) {
        if mailbox.address == replier_address {
            continue;
        }
        if seen.insert(mailbox.address.clone()) {
            recipients.push(mailbox);
        }
    }
    recipients
}

/// Prepends a `Resent-*` block for a forward, preserving any prior chain.
pub fn build_resent_header(
    original: &MessageMetadata,
    forward_list: Vec<Mailbox>,
    now_ms: u64,
    new_message_id: String,
) -> ResentHeader {
    ResentHeader {
        resent_from: original.from.clone(),
        resent_to: forward_list,
        resent_date_ms: now_ms,
        resent_message_id: new_message_id,
    }
}
