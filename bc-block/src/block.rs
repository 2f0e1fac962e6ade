// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::errors::Error;
use crate::kind::{BlockKind, DataType};
use crate::sizes::BlockSize;
use bc_primitives::{sha3_512, Checksum};
use chrono::{DateTime, Utc};
use std::cell::Cell;

/// A fixed-size buffer identified by the SHA3-512 of its bytes.
///
/// `checksum` is never stored on the wire; it is a pure function of
/// `payload` and is cached after the first computation. Any mutation of the
/// payload invalidates the cache so the next read recomputes it.
#[derive(Debug)]
pub struct Block {
    payload: Vec<u8>,
    kind: BlockKind,
    data_type: DataType,
    length_without_padding: u64,
    date_created: DateTime<Utc>,
    /// Present for ephemeral variants (structured/unstructured ephemeral
    /// data); absent for durable block kinds.
    creator: Option<Vec<u8>>,
    checksum_cache: Cell<Option<Checksum>>,
}

impl Block {
    pub fn new(
        payload: Vec<u8>,
        kind: BlockKind,
        data_type: DataType,
        length_without_padding: u64,
        date_created: DateTime<Utc>,
    ) -> Result<Self, Error> {
        BlockSize::from_bytes(payload.len())?;
        Ok(Block {
            payload,
            kind,
            data_type,
            length_without_padding,
            date_created,
            creator: None,
            checksum_cache: Cell::new(None),
        })
    }

    pub fn with_creator(mut self, creator: Vec<u8>) -> Self {
        self.creator = Some(creator);
        self
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Mutable access to the payload. Invalidates the checksum cache: the
    /// caller is assumed to be about to change the bytes.
    pub fn payload_mut(&mut self) -> &mut Vec<u8> {
        self.checksum_cache.set(None);
        &mut self.payload
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn length_without_padding(&self) -> u64 {
        self.length_without_padding
    }

    pub fn date_created(&self) -> DateTime<Utc> {
        self.date_created
    }

    pub fn creator(&self) -> Option<&[u8]> {
        self.creator.as_deref()
    }

    pub fn block_size(&self) -> BlockSize {
        BlockSize::from_bytes(self.payload.len()).expect("payload length validated at construction")
    }

    /// The block's content identifier, computed from `payload` alone and
    /// cached after the first call.
    pub fn checksum(&self) -> Checksum {
        if let Some(c) = self.checksum_cache.get() {
            return c;
        }
        let c = sha3_512(&self.payload);
        self.checksum_cache.set(Some(c));
        c
    }
}
