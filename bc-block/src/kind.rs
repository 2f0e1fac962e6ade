// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

/// Polymorphism over block content is modeled as a tagged variant rather
/// than an inheritance hierarchy: a block's shared metadata (checksum,
/// `dateCreated`, `lengthWithoutPadding`) lives on [`crate::block::Block`]
/// itself, and `BlockKind`/`DataType` carry the per-variant meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    RawData,
    Random,
    Fec,
    ConstituentBlockList,
    ExtendedCbl,
    EncryptedOwned,
    EncryptedCbl,
    EncryptedExtendedCbl,
    MultiRecipientEncrypted,
    OwnerFreeWhitened,
}

impl BlockKind {
    pub fn is_cbl(self) -> bool {
        matches!(
            self,
            BlockKind::ConstituentBlockList
                | BlockKind::ExtendedCbl
                | BlockKind::EncryptedCbl
                | BlockKind::EncryptedExtendedCbl
        )
    }

    pub fn is_extended_cbl(self) -> bool {
        matches!(
            self,
            BlockKind::ExtendedCbl | BlockKind::EncryptedExtendedCbl
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    Raw,
    EncryptedData,
    EphemeralStructuredData,
    EphemeralUnstructuredData,
}
