// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Byte-primitive error.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("length mismatch: {a} != {b}")]
    LengthMismatch { a: usize, b: usize },
    #[error("xor_ct_many requires at least one input")]
    EmptyInput,
}
