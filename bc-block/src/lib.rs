// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The block abstraction and capacity calculator.

pub mod block;
pub mod capacity;
pub mod errors;
pub mod kind;
pub mod sizes;

pub use block::Block;
pub use capacity::{
    address_capacity, capacity, cbl_base_header_size, CapacityEncryptionMode, CapacityParams,
    CblMeta, OverheadBreakdown, MAX_RECIPIENTS,
};
pub use errors::Error;
pub use kind::{BlockKind, DataType};
pub use sizes::BlockSize;
