// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no data blocks given to encode")]
    EmptyDataBlocks,
    #[error("data block {index} has length {actual}, expected {expected}")]
    ShardLengthMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("{missing} of {total} shards are missing or corrupt, exceeding the {parity_count} parity shards available")]
    UnrecoverableLoss {
        missing: usize,
        parity_count: usize,
        total: usize,
    },
    #[error("reed-solomon codec error: {0}")]
    Codec(#[from] reed_solomon_erasure::Error),
}
