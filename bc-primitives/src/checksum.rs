// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::bytes::eq_ct;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_512};
use std::fmt;

/// Number of bytes in a BrightChain content identifier.
pub const CHECKSUM_LEN: usize = 64;

/// A SHA3-512 content identifier. Always exactly [`CHECKSUM_LEN`] bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum([u8; CHECKSUM_LEN]);

impl Checksum {
    pub fn from_bytes(bytes: [u8; CHECKSUM_LEN]) -> Self {
        Checksum(bytes)
    }

    /// Returns `None` if `slice` is not exactly [`CHECKSUM_LEN`] bytes.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let arr: [u8; CHECKSUM_LEN] = slice.try_into().ok()?;
        Some(Checksum(arr))
    }

    pub fn as_bytes(&self) -> &[u8; CHECKSUM_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", self.to_hex())
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Serialized as a lowercase hex string, matching every other wire/display
/// representation of a checksum in this codebase.
impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Checksum::from_hex(&s).ok_or_else(|| de::Error::custom("invalid checksum hex string"))
    }
}

/// Computes the SHA3-512 checksum of `range`.
pub fn sha3_512(range: &[u8]) -> Checksum {
    let mut hasher = Sha3_512::new();
    hasher.update(range);
    let digest = hasher.finalize();
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest);
    Checksum(out)
}

/// Constant-time checksum equality. Any code path comparing a received MAC
/// or declared identifier to a computed one must go through this, not `==`.
pub fn eq(a: &Checksum, b: &Checksum) -> bool {
    eq_ct(&a.0, &b.0)
}
