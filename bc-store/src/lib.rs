// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Content-addressed in-memory block store: insert/has/get/delete, CBL
//! assembly orchestration, and Reed-Solomon-backed recovery on read.

pub mod config;
pub mod errors;
pub mod store;

pub use bc_fec::DurabilityLevel;
pub use config::StoreConfig;
pub use errors::Error;
pub use store::{MemoryBlockStore, StoreCblOptions, StoreCblResult};
