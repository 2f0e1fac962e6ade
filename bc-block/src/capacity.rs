// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::errors::Error;
use crate::kind::BlockKind;
use crate::sizes::BlockSize;
use bc_primitives::CHECKSUM_LEN;

/// Encryption mode as seen by the capacity calculator. This is coarser than
/// [`bc_crypto`]'s `EncryptionScheme`: it only distinguishes how many
/// recipient key encapsulations a block must carry, not the cipher used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapacityEncryptionMode {
    None,
    SingleRecipient,
    MultiRecipient,
}

/// Fixed per-block ECIES preamble: ephemeral public key (65) + IV (16) + MAC (32).
pub const SINGLE_RECIPIENT_PREAMBLE: usize = 113;
/// Fixed preamble shared by all recipients of a multi-recipient block: IV (16) + MAC (16).
pub const MULTI_RECIPIENT_PREAMBLE: usize = 32;
/// Bytes needed per recipient to carry one ECIES-wrapped symmetric key.
pub const PER_RECIPIENT_KEY_SIZE: usize = 113;
/// Upper bound on recipients a single multi-recipient block may address.
pub const MAX_RECIPIENTS: usize = 1024;
/// Default creator-identifier size assumed when none is given explicitly.
pub const DEFAULT_ID_SIZE: usize = 16;

/// Size in bytes of a non-extended CBL header for the given creator-id size.
/// `4 (prefix) + idSize + 8 (date) + 4 (addressCount) + 1 (tupleSize)
/// + 8 (originalDataLength) + 64 (originalDataChecksum) + 1 (isExtended)
/// + 64 (signature)`.
pub const fn cbl_base_header_size(id_size: usize) -> usize {
    4 + id_size + 8 + 4 + 1 + 8 + CHECKSUM_LEN + 1 + 64
}

/// Extended-CBL metadata describing a filename/MIME pair, used only to
/// compute `variableOverhead`.
#[derive(Clone, Debug, Default)]
pub struct CblMeta {
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

impl CblMeta {
    /// `2-byte length prefix + fileName bytes + 1-byte length prefix + mimeType bytes`.
    fn variable_overhead(&self) -> usize {
        let file_name = self.file_name.as_deref().unwrap_or("");
        let mime_type = self.mime_type.as_deref().unwrap_or("");
        2 + file_name.len() + 1 + mime_type.len()
    }
}

#[derive(Clone, Debug)]
pub struct CapacityParams {
    pub block_size: BlockSize,
    pub block_kind: BlockKind,
    pub encryption: CapacityEncryptionMode,
    pub recipient_count: Option<usize>,
    pub cbl_meta: Option<CblMeta>,
    pub id_size: usize,
}

impl CapacityParams {
    pub fn new(block_size: BlockSize, block_kind: BlockKind, encryption: CapacityEncryptionMode) -> Self {
        CapacityParams {
            block_size,
            block_kind,
            encryption,
            recipient_count: None,
            cbl_meta: None,
            id_size: DEFAULT_ID_SIZE,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverheadBreakdown {
    pub base_header: usize,
    pub type_specific_overhead: usize,
    pub encryption_overhead: usize,
    pub variable_overhead: usize,
}

impl OverheadBreakdown {
    pub fn total(&self) -> usize {
        self.base_header + self.type_specific_overhead + self.encryption_overhead + self.variable_overhead
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capacity {
    pub total_capacity: usize,
    pub available_capacity: usize,
    pub overhead: usize,
    pub breakdown: OverheadBreakdown,
}

/// Computes the usable capacity of a block given its size, kind, and
/// encryption mode. See spec §4.5.
pub fn capacity(params: &CapacityParams) -> Result<Capacity, Error> {
    let block_size = params.block_size.bytes();

    // Constant per block kind; the core deployment uses no generic
    // block-level preamble beyond what each type already accounts for.
    let base_header = 0usize;

    let type_specific_overhead = if params.block_kind.is_cbl() {
        cbl_base_header_size(params.id_size)
    } else {
        0
    };

    let variable_overhead = if params.block_kind.is_extended_cbl() {
        params.cbl_meta.clone().unwrap_or_default().variable_overhead()
    } else {
        0
    };

    let encryption_overhead = match params.encryption {
        CapacityEncryptionMode::None => 0,
        CapacityEncryptionMode::SingleRecipient => SINGLE_RECIPIENT_PREAMBLE,
        CapacityEncryptionMode::MultiRecipient => {
            let count = params.recipient_count.ok_or(Error::RecipientCountRequired)?;
            if count < 1 {
                return Err(Error::RecipientCountRequired);
            }
            if count > MAX_RECIPIENTS {
                return Err(Error::RecipientCountTooLarge(count, MAX_RECIPIENTS));
            }
            MULTI_RECIPIENT_PREAMBLE + count * PER_RECIPIENT_KEY_SIZE
        }
    };

    let breakdown = OverheadBreakdown {
        base_header,
        type_specific_overhead,
        encryption_overhead,
        variable_overhead,
    };
    let overhead = breakdown.total();

    if overhead >= block_size {
        return Err(Error::BlockTooSmall { block_size, overhead });
    }

    let available_capacity = block_size - overhead;
    Ok(Capacity {
        total_capacity: block_size,
        available_capacity,
        overhead,
        breakdown,
    })
}

/// Number of 64-byte content identifiers that fit in `available_capacity`.
pub fn address_capacity(available_capacity: usize) -> usize {
    available_capacity / CHECKSUM_LEN
}
