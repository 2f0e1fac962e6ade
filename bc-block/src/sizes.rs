// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::errors::Error;

/// The declared block sizes for a deployment. Values are fixed once a
/// network is deployed; these defaults are sized for local testing and
/// small payloads rather than production durability targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockSize {
    Message,
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
}

impl BlockSize {
    pub const ALL: [BlockSize; 6] = [
        BlockSize::Message,
        BlockSize::Tiny,
        BlockSize::Small,
        BlockSize::Medium,
        BlockSize::Large,
        BlockSize::Huge,
    ];

    /// Size in bytes for the default deployment configuration.
    pub const fn bytes(self) -> usize {
        match self {
            BlockSize::Message => 512,
            BlockSize::Tiny => 1024,
            BlockSize::Small => 4096,
            BlockSize::Medium => 1_048_576,
            BlockSize::Large => 67_108_864,
            BlockSize::Huge => 268_435_456,
        }
    }

    pub fn from_bytes(n: usize) -> Result<Self, Error> {
        Self::ALL
            .into_iter()
            .find(|s| s.bytes() == n)
            .ok_or(Error::InvalidBlockSize(n))
    }
}
