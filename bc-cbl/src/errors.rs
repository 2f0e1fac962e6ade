// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid tuple size {0}")]
    InvalidTupleSize(usize),
    #[error("original data length {0} exceeds the maximum safely representable length")]
    FileTooLarge(u64),
    #[error("address count {address_count} exceeds this block's capacity of {capacity}")]
    AddressCountExceedsCapacity { address_count: u32, capacity: usize },
    #[error("structured prefix CRC-8 mismatch: expected {expected:#04x}, got {actual:#04x}")]
    CrcMismatch { expected: u8, actual: u8 },
    #[error("bad magic byte {0:#04x}, expected 0xBC")]
    BadMagicByte(u8),
    #[error("unknown CBL block type byte {0:#04x}")]
    UnknownBlockType(u8),
    #[error("buffer too short: needed at least {needed} bytes, got {actual}")]
    BufferTooShort { needed: usize, actual: usize },
    #[error("signature is invalid")]
    SignatureInvalid,
    #[error("checksum mismatch: reconstructed payload does not match originalDataChecksum")]
    ChecksumMismatch,
    #[error("block is missing from the store: {0}")]
    MissingBlock(String),
    #[error("malformed UTF-8 in extended CBL filename")]
    InvalidFileName,
    #[error("invalid magnet URL: {0}")]
    InvalidMagnetUrl(String),
    #[error(transparent)]
    Whitening(#[from] bc_whitening::Error),
    #[error(transparent)]
    Block(#[from] bc_block::Error),
    #[error(transparent)]
    Primitive(#[from] bc_primitives::Error),
}
