// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid tuple size {0}, must be within the configured tuple bounds")]
    InvalidTupleSize(usize),
    #[error("whitening tuple is empty")]
    EmptyTuple,
    #[error(transparent)]
    Primitive(#[from] bc_primitives::Error),
}
