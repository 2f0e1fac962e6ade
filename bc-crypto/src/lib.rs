// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Encryption and signing adapter layered over BrightChain block payloads:
//! `SharedKey`, `RecipientKeys`, and `SMIME` schemes, plus the
//! `MemberIdentity` seam the messaging core signs and encrypts against.

pub mod encryption;
pub mod errors;
pub mod identity;

pub use encryption::{
    decrypt_recipient_keys, decrypt_shared_key, encrypt_recipient_keys, encrypt_shared_key, encrypt_smime,
    verify_smime_signature, EncryptedPayload, EncryptionScheme,
};
pub use errors::Error;
pub use identity::{LocalMemberIdentity, MemberIdentity};
