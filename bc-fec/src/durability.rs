// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Serialize};

/// Minimum parity shard count a `HighDurability` store operation will
/// request if the deployment does not configure a larger one.
pub const DEFAULT_HIGH_DURABILITY_PARITY: usize = 2;

/// Durability configured per store operation (spec §4.8). Serialized in
/// its string form, matching the source ecosystem's resolved naming.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurabilityLevel {
    Ephemeral,
    Standard,
    HighDurability,
}

impl DurabilityLevel {
    /// Number of Reed-Solomon parity shards this level asks for. `high_durability_parity`
    /// is a deployment-configured floor for `HighDurability` and is ignored otherwise.
    pub fn parity_count(self, high_durability_parity: usize) -> usize {
        match self {
            DurabilityLevel::Ephemeral => 0,
            DurabilityLevel::Standard => 1,
            DurabilityLevel::HighDurability => high_durability_parity.max(DEFAULT_HIGH_DURABILITY_PARITY),
        }
    }
}
