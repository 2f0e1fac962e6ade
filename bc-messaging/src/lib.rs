// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Owner-free messaging built on top of `bc-store`'s CBLs: BCC-private
//! send, threading, attachments, and gossip-driven inbound delivery.

pub mod attachments;
pub mod bcc;
pub mod core;
pub mod delivery;
pub mod errors;
pub mod inbox;
pub mod message_id;
pub mod threading;
pub mod types;

pub use attachments::{AttachmentStore, MemoryAttachmentStore};
pub use core::{fetch_attachment, MessagingConfig, MessagingCore, SendMessageResult};
pub use errors::Error;
pub use message_id::generate_message_id;
pub use types::{
    addresses, Attachment, DeliveryStatus, Folder, InboxFilter, Mailbox, MessageMetadata, ResentHeader, SendMessageInput,
};
