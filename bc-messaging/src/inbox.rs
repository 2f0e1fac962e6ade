// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::types::{Folder, InboxFilter, MessageMetadata};

/// A copy is visible in `userId`'s inbox view if they are its sender (Sent
/// folder) or one of its to/cc/bcc recipients (Inbox folder, the default).
fn matches_folder(copy: &MessageMetadata, user_id: &str, folder: Option<Folder>) -> bool {
    match folder {
        Some(Folder::Sent) => copy.from.address == user_id,
        Some(Folder::Inbox) | None => copy
            .to
            .iter()
            .chain(copy.cc.iter())
            .chain(copy.bcc.iter())
            .any(|m| m.address == user_id),
    }
}

/// Filters `copies` (every stored copy of every message) down to the ones
/// visible to `user_id` under `filter`.
pub fn query_inbox<'a>(copies: impl Iterator<Item = &'a MessageMetadata>, user_id: &str, filter: &InboxFilter) -> Vec<&'a MessageMetadata> {
    copies
        .filter(|copy| matches_folder(copy, user_id, filter.folder))
        .filter(|copy| !filter.unread_only || !copy.read_by.iter().any(|r| r == user_id))
        .filter(|copy| filter.since_ms.map(|since| copy.date_created_ms >= since).unwrap_or(true))
        .collect()
}

pub fn unread_count<'a>(copies: impl Iterator<Item = &'a MessageMetadata>, user_id: &str) -> usize {
    copies
        .filter(|copy| matches_folder(copy, user_id, Some(Folder::Inbox)))
        .filter(|copy| !copy.read_by.iter().any(|r| r == user_id))
        .count()
}

/// Walks the `in_reply_to`/`references` graph from `target` to find every
/// message in the same thread, returning them in `References` order (i.e.
/// chronological, since `References` only ever grows by appending).
pub fn get_thread<'a>(by_id: &std::collections::HashMap<String, &'a MessageMetadata>, target_id: &str) -> Vec<&'a MessageMetadata> {
    let Some(target) = by_id.get(target_id) else {
        return Vec::new();
    };

    let mut thread_ids: std::collections::HashSet<String> = target.references.iter().cloned().collect();
    thread_ids.insert(target_id.to_string());

    // descendants: any message whose references (or in_reply_to) names a
    // message already in the thread.
    let mut changed = true;
    while changed {
        changed = false;
        for (id, copy) in by_id.iter() {
            if thread_ids.contains(id.as_str()) {
                continue;
            }
            let refers_into_thread = copy.references.iter().any(|r| thread_ids.contains(r))
                || copy.in_reply_to.as_deref().map(|p| thread_ids.contains(p)).unwrap_or(false);
            if refers_into_thread {
                thread_ids.insert(id.clone());
                changed = true;
            }
        }
    }

    let mut thread: Vec<&MessageMetadata> = thread_ids.iter().filter_map(|id| by_id.get(id.as_str()).copied()).collect();
    thread.sort_by_key(|copy| copy.date_created_ms);
    thread
}
