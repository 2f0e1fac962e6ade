// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use bc_block::capacity::DEFAULT_ID_SIZE;
use bc_fec::DEFAULT_HIGH_DURABILITY_PARITY;

/// Deployment-wide parameters a [`crate::MemoryBlockStore`] is built with.
#[derive(Clone, Copy, Debug)]
pub struct StoreConfig {
    pub id_size: usize,
    pub high_durability_parity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            id_size: DEFAULT_ID_SIZE,
            high_durability_parity: DEFAULT_HIGH_DURABILITY_PARITY,
        }
    }
}
