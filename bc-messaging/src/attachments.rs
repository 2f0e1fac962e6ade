// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::errors::Error;
use crate::types::Attachment;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use md5::{Digest as Md5Digest, Md5};
use parking_lot::RwLock;
use sha2::{Digest as Sha256Digest, Sha256};
use std::collections::HashMap;

/// Attachment content addressed by lowercase hex of `SHA-256(content)`
/// (spec §4.12), independent of the block store's SHA3-512 checksums.
pub trait AttachmentStore: Send + Sync {
    fn store_attachment_content(&self, key: &str, bytes: Vec<u8>);
    fn get_attachment_content(&self, key: &str) -> Option<Vec<u8>>;
}

#[derive(Default)]
pub struct MemoryAttachmentStore {
    content: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryAttachmentStore {
    pub fn new() -> Self {
        MemoryAttachmentStore::default()
    }
}

impl AttachmentStore for MemoryAttachmentStore {
    fn store_attachment_content(&self, key: &str, bytes: Vec<u8>) {
        self.content.write().insert(key.to_string(), bytes);
    }

    fn get_attachment_content(&self, key: &str) -> Option<Vec<u8>> {
        self.content.read().get(key).cloned()
    }
}

/// Computes both digests, stores the content by its SHA-256 key, and
/// returns the attachment's metadata record with a `magnet:?xt=urn:cbl:`
/// URL built from the SHA-256 hex (per §4.12, reusing the CBL magnet
/// grammar as the URL shape rather than minting a second one).
pub fn ingest_attachment<S: AttachmentStore + ?Sized>(
    store: &S,
    filename: &str,
    mime_type: &str,
    bytes: Vec<u8>,
) -> Result<Attachment, Error> {
    let sha256_hex = hex::encode(Sha256::digest(&bytes));
    let md5_base64 = BASE64_STANDARD.encode(Md5::digest(&bytes));
    let size = bytes.len() as u64;
    let magnet_url = format!("magnet:?xt=urn:cbl:{sha256_hex}");

    store.store_attachment_content(&sha256_hex, bytes);

    Ok(Attachment {
        filename: filename.to_string(),
        mime_type: mime_type.to_string(),
        sha256_hex,
        md5_base64,
        magnet_url,
        size,
    })
}

pub fn fetch_attachment_content<S: AttachmentStore + ?Sized>(store: &S, attachment: &Attachment) -> Result<Vec<u8>, Error> {
    store
        .get_attachment_content(&attachment.sha256_hex)
        .ok_or_else(|| Error::AttachmentMissing(attachment.sha256_hex.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_computes_both_digests_and_round_trips_content() {
        let store = MemoryAttachmentStore::new();
        let attachment = ingest_attachment(&store, "notes.txt", "text/plain", b"hello attachment".to_vec()).unwrap();

        assert_eq!(attachment.sha256_hex.len(), 64);
        assert!(attachment.sha256_hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
        assert_eq!(attachment.magnet_url, format!("magnet:?xt=urn:cbl:{}", attachment.sha256_hex));

        let content = fetch_attachment_content(&store, &attachment).unwrap();
        assert_eq!(content, b"hello attachment");
    }

    #[test]
    fn fetch_of_unstored_key_fails() {
        let store = MemoryAttachmentStore::new();
        let phantom = Attachment {
            filename: "x".to_string(),
            mime_type: "x".to_string(),
            sha256_hex: "0".repeat(64),
            md5_base64: String::new(),
            magnet_url: String::new(),
            size: 0,
        };
        assert!(matches!(fetch_attachment_content(&store, &phantom), Err(Error::AttachmentMissing(_))));
    }
}
