// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("block not found: {0}")]
    NotFound(String),
    #[error("block {0} is a whitening partner of a live CBL and cannot be deleted")]
    BlockInUse(String),
    #[error("magnet URL names an unknown CBL: {0}")]
    UnknownCbl(String),
    #[error(transparent)]
    Cbl(#[from] bc_cbl::Error),
    #[error(transparent)]
    Fec(#[from] bc_fec::Error),
}
