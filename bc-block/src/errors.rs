// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid block size: {0} bytes is not a declared block size")]
    InvalidBlockSize(usize),
    #[error("invalid block type: {0}")]
    InvalidBlockType(String),
    #[error("invalid encryption type: {0}")]
    InvalidEncryptionType(String),
    #[error("recipient count is required for this encryption mode")]
    RecipientCountRequired,
    #[error("recipient count {0} exceeds the maximum of {1}")]
    RecipientCountTooLarge(usize, usize),
    #[error("block is too small to hold its required overhead ({overhead} bytes for a {block_size} byte block)")]
    BlockTooSmall { block_size: usize, overhead: usize },
}
