// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::attachments::{fetch_attachment_content, ingest_attachment, AttachmentStore};
use crate::bcc::{per_bcc_announcement, to_cc_announcement};
use crate::delivery::{apply_ack, index_copy, should_index};
use crate::errors::Error;
use crate::inbox::{get_thread, query_inbox, unread_count};
use crate::message_id::generate_message_id;
use crate::threading::{build_reply_headers, build_resent_header, reply_all_recipients, DEFAULT_MAX_REFERENCES_COUNT};
use crate::types::{addresses, Attachment, DeliveryStatus, InboxFilter, Mailbox, MessageMetadata, SendMessageInput};
use bc_crypto::{encrypt_recipient_keys, EncryptedPayload, LocalMemberIdentity, MemberIdentity};
use bc_fec::DurabilityLevel;
use bc_gossip::{Announcement, GossipBus};
use bc_store::{MemoryBlockStore, StoreCblOptions};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use x25519_dalek::PublicKey;

pub struct MessagingConfig {
    pub node_id: String,
    pub block_size: bc_block::BlockSize,
    pub tuple_size: u8,
    pub durability: DurabilityLevel,
    pub max_references_count: usize,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        MessagingConfig {
            node_id: "node".to_string(),
            block_size: bc_block::BlockSize::Medium,
            tuple_size: 3,
            durability: DurabilityLevel::Standard,
            max_references_count: DEFAULT_MAX_REFERENCES_COUNT,
        }
    }
}

pub struct SendMessageResult {
    pub message_id: String,
    pub success: bool,
    pub error: Option<String>,
    pub announcement_count: usize,
}

/// Ties the block store, gossip bus, attachment store, and a local identity
/// together into the operations named in §4.10.
pub struct MessagingCore {
    config: MessagingConfig,
    store: MemoryBlockStore,
    gossip: Arc<dyn GossipBus>,
    attachments: Arc<dyn AttachmentStore>,
    identity: LocalMemberIdentity,
    directory: RwLock<HashMap<String, PublicKey>>,
    local_addresses: RwLock<HashSet<String>>,
    metadata: RwLock<HashMap<String, Vec<MessageMetadata>>>,
}

impl MessagingCore {
    pub fn new(
        config: MessagingConfig,
        store: MemoryBlockStore,
        gossip: Arc<dyn GossipBus>,
        attachments: Arc<dyn AttachmentStore>,
        identity: LocalMemberIdentity,
    ) -> Self {
        MessagingCore {
            config,
            store,
            gossip,
            attachments,
            identity,
            directory: RwLock::new(HashMap::new()),
            local_addresses: RwLock::new(HashSet::new()),
            metadata: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_local_address(&self, address: impl Into<String>) {
        self.local_addresses.write().insert(address.into());
    }

    pub fn register_recipient_public_key(&self, address: impl Into<String>, public_key: PublicKey) {
        self.directory.write().insert(address.into(), public_key);
    }

    pub fn send_message(&self, input: SendMessageInput, now_ms: u64) -> Result<SendMessageResult, Error> {
        if input.to.is_empty() && input.cc.is_empty() && input.bcc.is_empty() {
            return Err(Error::NoRecipients);
        }
        let message_id = generate_message_id(&self.config.node_id, now_ms)?;
        let attachments = input
            .attachments
            .iter()
            .map(|(name, mime, bytes)| ingest_attachment(self.attachments.as_ref(), name, mime, bytes.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut announcement_count = 0usize;
        let mut delivery_error: Option<String> = None;
        let mut copies = Vec::new();

        // 1. sender's full metadata copy, cleartext, every BCC address visible.
        let sender_copy = self.build_and_store_copy(
            &message_id,
            &input,
            input.to.clone(),
            input.cc.clone(),
            input.bcc.clone(),
            &attachments,
            now_ms,
            None,
        )?;
        copies.push(sender_copy);

        // 2. To/CC copy, bcc stripped, one announcement to to∪cc.
        if !input.to.is_empty() || !input.cc.is_empty() {
            let to_cc_copy = self.build_and_store_copy(&message_id, &input, input.to.clone(), input.cc.clone(), vec![], &attachments, now_ms, None)?;
            let announcement = to_cc_announcement(
                &self.config.node_id,
                now_ms,
                to_cc_copy.primary_cbl_checksum,
                message_id.clone(),
                &to_cc_copy.to,
                &to_cc_copy.cc,
            );
            match self.gossip.publish(announcement) {
                Ok(()) => announcement_count += 1,
                Err(e) => delivery_error = Some(e.to_string()),
            }
            copies.push(to_cc_copy);
        }

        // 3. one per-BCC copy, bcc stripped, to = to ∪ {b}, RecipientKeys encryption.
        for b in &input.bcc {
            let mut to_for_copy = input.to.clone();
            to_for_copy.push(b.clone());
            let encrypt_for = self.directory.read().get(&b.address).map(|pk| (b.address.clone(), *pk));
            let bcc_copy = self.build_and_store_copy(&message_id, &input, to_for_copy, input.cc.clone(), vec![], &attachments, now_ms, encrypt_for)?;
            let announcement = per_bcc_announcement(&self.config.node_id, now_ms, bcc_copy.primary_cbl_checksum, message_id.clone(), b);
            match self.gossip.publish(announcement) {
                Ok(()) => announcement_count += 1,
                Err(e) => delivery_error = Some(e.to_string()),
            }
            copies.push(bcc_copy);
        }

        self.metadata.write().insert(message_id.clone(), copies);

        Ok(SendMessageResult {
            message_id,
            success: true,
            error: delivery_error,
            announcement_count,
        })
    }

    pub fn get_message(&self, id: &str) -> Result<MessageMetadata, Error> {
        self.metadata
            .read()
            .get(id)
            .and_then(|copies| copies.first().cloned())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub fn get_message_content(&self, id: &str) -> Result<Vec<u8>, Error> {
        let copy = self.get_message(id)?;
        let stored = self.store.retrieve_cbl(&self.identity, &copy.primary_cbl_checksum)?;
        if !copy.is_encrypted {
            return Ok(stored);
        }
        let payload: EncryptedPayload = serde_json::from_slice(&stored)?;
        let recipient_address = copy.to.last().map(|m| m.address.clone()).ok_or_else(|| Error::NotFound(id.to_string()))?;
        Ok(bc_crypto::decrypt_recipient_keys(&self.identity, &recipient_address, &self.identity.public_key(), &payload)?)
    }

    pub fn delete_message(&self, id: &str) -> Result<(), Error> {
        let removed = self.metadata.write().remove(id);
        if removed.is_none() {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn query_inbox(&self, user_id: &str, filter: &InboxFilter) -> Vec<MessageMetadata> {
        let metadata = self.metadata.read();
        query_inbox(metadata.values().flatten(), user_id, filter).into_iter().cloned().collect()
    }

    pub fn mark_as_read(&self, id: &str, user_id: &str) -> Result<(), Error> {
        let mut metadata = self.metadata.write();
        let copies = metadata.get_mut(id).ok_or_else(|| Error::NotFound(id.to_string()))?;
        for copy in copies.iter_mut() {
            if !copy.read_by.iter().any(|r| r == user_id) {
                copy.read_by.push(user_id.to_string());
            }
        }
        Ok(())
    }

    pub fn get_unread_count(&self, user_id: &str) -> usize {
        let metadata = self.metadata.read();
        unread_count(metadata.values().flatten(), user_id)
    }

    pub fn get_thread(&self, id: &str) -> Vec<MessageMetadata> {
        let metadata = self.metadata.read();
        let by_id: HashMap<String, &MessageMetadata> = metadata.values().filter_map(|copies| copies.first()).map(|c| (c.message_id.clone(), c)).collect();
        get_thread(&by_id, id).into_iter().cloned().collect()
    }

    pub fn reply(&self, id: &str, replier_address: &str, mut input: SendMessageInput, now_ms: u64) -> Result<SendMessageResult, Error> {
        let parent = self.get_message(id)?;
        let (in_reply_to, references) = build_reply_headers(&parent, self.config.max_references_count);
        input.in_reply_to = Some(in_reply_to);
        input.references = references;
        if input.to.is_empty() && input.cc.is_empty() && input.bcc.is_empty() {
            input.to = reply_all_recipients(&parent, replier_address);
        }
        self.send_message(input, now_ms)
    }

    pub fn forward(&self, id: &str, recipients: Vec<Mailbox>, now_ms: u64) -> Result<SendMessageResult, Error> {
        let original = self.get_message(id)?;
        let content = self.get_message_content(id)?;

        let input = SendMessageInput {
            from: original.from.clone(),
            to: recipients.clone(),
            cc: vec![],
            bcc: vec![],
            reply_to: original.reply_to.clone(),
            subject: original.subject.clone(),
            body: content,
            attachments: vec![],
            in_reply_to: original.in_reply_to.clone(),
            references: original.references.clone(),
        };
        // forward doesn't re-run attachment ingestion; the fresh copies simply
        // carry the original's already-ingested attachment records forward.
        let result = self.send_message(input, now_ms)?;
        let resent = build_resent_header(&original, recipients, now_ms, result.message_id.clone());
        if let Some(copies) = self.metadata.write().get_mut(&result.message_id) {
            for copy in copies.iter_mut() {
                copy.attachments = original.attachments.clone();
                copy.resent_chain = original.resent_chain.clone();
                copy.resent_chain.push(resent.clone());
            }
        }
        Ok(result)
    }

    pub fn get_delivery_status(&self, id: &str) -> Result<HashMap<String, DeliveryStatus>, Error> {
        let metadata = self.metadata.read();
        let copies = metadata.get(id).ok_or_else(|| Error::NotFound(id.to_string()))?;
        let mut merged = HashMap::new();
        for copy in copies {
            merged.extend(copy.delivery_status.clone());
        }
        Ok(merged)
    }

    /// Acknowledges delivery of `message_id` to `recipient_address`.
    pub fn acknowledge_delivery(&self, message_id: &str, recipient_address: &str, failed: bool) -> Result<(), Error> {
        let mut metadata = self.metadata.write();
        let copies = metadata.get_mut(message_id).ok_or_else(|| Error::NotFound(message_id.to_string()))?;
        for copy in copies.iter_mut() {
            if copy.delivery_status.contains_key(recipient_address) {
                apply_ack(copy, recipient_address, failed);
            }
        }
        Ok(())
    }

    /// §4.13: on a received announcement, index it if it addresses a local
    /// identity. Fetches the referenced CBL and reconstructs the metadata
    /// copy. Idempotent — see [`index_copy`].
    pub fn handle_inbound_announcement(&self, announcement: &Announcement, placeholder: MessageMetadata) -> Result<(), Error> {
        let local = self.local_addresses.read();
        if should_index(announcement, &local).is_none() {
            return Ok(());
        }
        drop(local);
        let mut metadata = self.metadata.write();
        index_copy(&mut metadata, placeholder);
        Ok(())
    }

    fn build_and_store_copy(
        &self,
        message_id: &str,
        input: &SendMessageInput,
        to: Vec<Mailbox>,
        cc: Vec<Mailbox>,
        bcc: Vec<Mailbox>,
        attachments: &[Attachment],
        now_ms: u64,
        encrypt_for: Option<(String, PublicKey)>,
    ) -> Result<MessageMetadata, Error> {
        let (payload, is_encrypted) = match encrypt_for {
            Some((address, public_key)) => {
                let mut recipients = HashMap::new();
                recipients.insert(address, public_key);
                let encrypted = encrypt_recipient_keys(&self.identity, &recipients, &input.body)?;
                (serde_json::to_vec(&encrypted)?, true)
            }
            None => (input.body.clone(), false),
        };

        let result = self.store.store_cbl_with_whitening(
            &payload,
            &self.identity,
            StoreCblOptions {
                block_size: self.config.block_size,
                tuple_size: self.config.tuple_size,
                extended: None,
                durability: self.config.durability,
                date_created_ms: now_ms,
            },
        )?;

        let mut delivery_status = HashMap::new();
        for address in addresses(&to).into_iter().chain(addresses(&cc)).chain(addresses(&bcc)) {
            delivery_status.insert(address, DeliveryStatus::Pending);
        }

        Ok(MessageMetadata {
            message_id: message_id.to_string(),
            block_id: result.primary_cbl_checksum.to_hex(),
            from: input.from.clone(),
            to,
            cc,
            bcc,
            reply_to: input.reply_to.clone(),
            subject: input.subject.clone(),
            date_created_ms: now_ms,
            in_reply_to: input.in_reply_to.clone(),
            references: input.references.clone(),
            resent_chain: vec![],
            primary_cbl_checksum: result.primary_cbl_checksum,
            attachments: attachments.to_vec(),
            read_by: vec![],
            delivery_status,
            is_encrypted,
        })
    }
}

pub fn fetch_attachment(core: &MessagingCore, attachment: &Attachment) -> Result<Vec<u8>, Error> {
    fetch_attachment_content(core.attachments.as_ref(), attachment)
}
