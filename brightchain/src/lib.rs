// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! BrightChain: a content-addressed, owner-free block store with CBL-based
//! file assembly, Reed-Solomon durability, and BCC-private messaging built
//! on top of it.
//!
//! This crate is a facade: it re-exports the sub-crates that do the actual
//! work and ties their defaults together in [`BrightChainConfig`]. See the
//! workspace's per-crate documentation for the storage format, whitening
//! scheme, and messaging wire shapes.

pub use bc_block::BlockSize;
pub use bc_cbl::{CblSigner, ExtendedMeta, MagnetUrl};
pub use bc_crypto::{EncryptionScheme, LocalMemberIdentity, MemberIdentity};
pub use bc_fec::DurabilityLevel;
pub use bc_gossip::{Announcement, ChannelGossipBus, GossipBus, SharedGossipBus};
pub use bc_keyring::{Keyring, KeyringConfig};
pub use bc_messaging::{MessagingConfig, MessagingCore, SendMessageInput, SendMessageResult};
pub use bc_primitives::Checksum;
pub use bc_store::{MemoryBlockStore, StoreCblOptions, StoreCblResult, StoreConfig};

use std::path::PathBuf;

/// Ties every sub-crate's tunable default together in one place: a backend
/// selector (here, the keyring's `Memory`/`File` split) plus plain fields
/// for the rest.
#[derive(Clone, Debug)]
pub struct BrightChainConfig {
    pub block_size: BlockSize,
    pub tuple_size: u8,
    pub durability: DurabilityLevel,
    pub max_references_count: usize,
    pub delivery_timeout_ms: u64,
    pub max_access_rate: u32,
    pub keyring: KeyringConfig,
}

impl Default for BrightChainConfig {
    fn default() -> Self {
        BrightChainConfig {
            block_size: BlockSize::Medium,
            tuple_size: 3,
            durability: DurabilityLevel::Standard,
            max_references_count: 20,
            delivery_timeout_ms: 30_000,
            max_access_rate: 5,
            keyring: resolve_keyring_config(),
        }
    }
}

/// `KEYRING_PATH` env var wins, as in [`bc_keyring::KeyringConfig::resolve`];
/// otherwise falls back to a platform data directory via
/// `directories::ProjectDirs`, rather than `bc-keyring`'s bare-filename
/// default.
fn resolve_keyring_config() -> KeyringConfig {
    if let Ok(path) = std::env::var("KEYRING_PATH") {
        if !path.is_empty() {
            return KeyringConfig::File(PathBuf::from(path));
        }
    }
    match directories::ProjectDirs::from("dev", "brightchain", "brightchain") {
        Some(dirs) => KeyringConfig::File(dirs.data_dir().join("keyring.json")),
        None => KeyringConfig::File(PathBuf::from("brightchain-keyring.json")),
    }
}

impl BrightChainConfig {
    pub fn messaging_config(&self, node_id: impl Into<String>) -> MessagingConfig {
        MessagingConfig {
            node_id: node_id.into(),
            block_size: self.block_size,
            tuple_size: self.tuple_size,
            durability: self.durability,
            max_references_count: self.max_references_count,
        }
    }
}
