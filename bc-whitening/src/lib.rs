// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The whitening engine: XORs a data block against random partner blocks so
//! that no single stored block reveals any bit of the original content.

pub mod engine;
pub mod errors;

pub use engine::{
    unwhiten, validate_tuple_size, whiten, RandomBlockPool, WhitenedTuple, DEFAULT_TUPLE_SIZE,
    TUPLE_MAX_SIZE, TUPLE_MIN_SIZE,
};
pub use errors::Error;
