// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Reed-Solomon parity generation and reconstruction for CBL data block sets.

pub mod durability;
pub mod engine;
pub mod errors;

pub use durability::{DurabilityLevel, DEFAULT_HIGH_DURABILITY_PARITY};
pub use engine::{generate_parity, reconstruct};
pub use errors::Error;
