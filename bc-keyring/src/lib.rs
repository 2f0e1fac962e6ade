// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Encrypted on-disk keyring for BrightChain node identities: per-entry
//! scrypt key derivation, AES-256-GCM encryption, and HMAC-based transport
//! auth challenges.

pub mod entry;
pub mod errors;
pub mod keyring;

pub use entry::KeyringEntry;
pub use errors::Error;
pub use keyring::{sign_auth_challenge, verify_auth_challenge, Keyring, KeyringConfig};
