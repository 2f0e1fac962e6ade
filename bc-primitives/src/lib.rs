// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Side-channel-safe byte primitives and content checksums.
//!
//! Everything in BrightChain that compares a received MAC, signature, or
//! declared block identifier against a freshly computed one goes through
//! [`checksum::eq`] or [`bytes::eq_ct`] rather than `==`.

pub mod bytes;
pub mod checksum;
pub mod errors;

pub use bytes::{eq_ct, xor_ct, xor_ct_many};
pub use checksum::{eq, sha3_512, Checksum, CHECKSUM_LEN};
pub use errors::Error;
