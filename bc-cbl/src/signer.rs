// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

/// Signs and verifies CBL headers. Key management is an external
/// collaborator (spec §1): `bc-crypto::MemberIdentity` is the production
/// implementation; tests use a bare HMAC stand-in.
///
/// The 64-byte signature width matches the checksum width; per the
/// unresolved design question in the source material, this specification
/// keeps an HMAC-based signature rather than introducing a true asymmetric
/// scheme.
pub trait CblSigner {
    fn creator_id(&self) -> Vec<u8>;
    fn sign(&self, data: &[u8]) -> [u8; 64];
    fn verify(&self, creator_id: &[u8], data: &[u8], signature: &[u8; 64]) -> bool;
}
