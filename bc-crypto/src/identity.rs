// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use bc_cbl::CblSigner;
use bc_keyring::Keyring;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Sha256, Sha512};
use x25519_dalek::{PublicKey, StaticSecret};

type HmacSha512 = Hmac<Sha512>;
type HmacSha256 = Hmac<Sha256>;

/// The external collaborator named in the messaging core: something that
/// can identify a member by address, expose a key-agreement public key,
/// and sign/verify content on that member's behalf.
pub trait MemberIdentity {
    fn address(&self) -> &str;
    fn public_key(&self) -> PublicKey;
    /// Computes the Diffie-Hellman shared secret with `their_public`, used
    /// as key-wrapping material for the `RecipientKeys`/`SMIME` schemes.
    fn diffie_hellman(&self, their_public: &PublicKey) -> [u8; 32];
    /// Signs `data` under this member's HMAC secret. Used for the CBL
    /// header signature, where the spec doesn't pin an algorithm.
    fn sign(&self, data: &[u8]) -> [u8; 64];
    /// Verifies a signature produced by `sign` for the same secret.
    fn verify(&self, data: &[u8], signature: &[u8; 64]) -> bool;
    /// Signs `data` with HMAC-SHA256, the primitive the `SMIME` scheme's
    /// sender signature is specified against.
    fn sign_sha256(&self, data: &[u8]) -> [u8; 32];
    /// Verifies a signature produced by `sign_sha256` for the same secret.
    fn verify_sha256(&self, data: &[u8], signature: &[u8; 32]) -> bool;
}

/// A locally-held identity: an x25519 keypair for key agreement plus an
/// HMAC secret for signing. Keeps no real ECDSA/Ed25519 signature scheme;
/// HMAC is retained as a deterministic stand-in, per design.
pub struct LocalMemberIdentity {
    address: String,
    secret: StaticSecret,
    public: PublicKey,
    hmac_secret: Vec<u8>,
}

impl LocalMemberIdentity {
    pub fn generate(address: impl Into<String>) -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        let mut hmac_secret = vec![0u8; 32];
        OsRng.fill_bytes(&mut hmac_secret);
        LocalMemberIdentity {
            address: address.into(),
            secret,
            public,
            hmac_secret,
        }
    }

    pub fn from_parts(address: impl Into<String>, secret_bytes: [u8; 32], hmac_secret: Vec<u8>) -> Self {
        let secret = StaticSecret::from(secret_bytes);
        let public = PublicKey::from(&secret);
        LocalMemberIdentity {
            address: address.into(),
            secret,
            public,
            hmac_secret,
        }
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    pub fn hmac_secret(&self) -> &[u8] {
        &self.hmac_secret
    }

    /// Persists this identity's secret key material into `keyring` under
    /// its own address, for a later `load_from_keyring` in the same node.
    pub fn persist_to_keyring(&self, keyring: &Keyring, password: &str, now_ms: i64) -> Result<(), crate::errors::Error> {
        let mut material = self.secret_bytes().to_vec();
        material.extend_from_slice(&self.hmac_secret);
        keyring.put(&self.address, password, &material, now_ms)?;
        Ok(())
    }

    /// Reloads an identity previously written by `persist_to_keyring`.
    pub fn load_from_keyring(keyring: &Keyring, address: &str, password: &str, now_ms: i64) -> Result<Self, crate::errors::Error> {
        let material = keyring.get(address, password, now_ms)?;
        if material.len() < 32 {
            return Err(crate::errors::Error::DecryptionFailed);
        }
        let (secret_bytes, hmac_secret) = material.split_at(32);
        let mut secret_arr = [0u8; 32];
        secret_arr.copy_from_slice(secret_bytes);
        Ok(LocalMemberIdentity::from_parts(address, secret_arr, hmac_secret.to_vec()))
    }
}

impl MemberIdentity for LocalMemberIdentity {
    fn address(&self) -> &str {
        &self.address
    }

    fn public_key(&self) -> PublicKey {
        self.public
    }

    fn diffie_hellman(&self, their_public: &PublicKey) -> [u8; 32] {
        *self.secret.diffie_hellman(their_public).as_bytes()
    }

    fn sign(&self, data: &[u8]) -> [u8; 64] {
        hmac_sha512(&self.hmac_secret, data)
    }

    fn verify(&self, data: &[u8], signature: &[u8; 64]) -> bool {
        bc_primitives::eq_ct(&hmac_sha512(&self.hmac_secret, data), signature)
    }

    fn sign_sha256(&self, data: &[u8]) -> [u8; 32] {
        hmac_sha256(&self.hmac_secret, data)
    }

    fn verify_sha256(&self, data: &[u8], signature: &[u8; 32]) -> bool {
        bc_primitives::eq_ct(&hmac_sha256(&self.hmac_secret, data), signature)
    }
}

/// `LocalMemberIdentity` doubles as a `CblSigner`, since both seams are the
/// same HMAC-stand-in signing scheme keyed by the member's secret.
impl CblSigner for LocalMemberIdentity {
    fn creator_id(&self) -> Vec<u8> {
        self.address.as_bytes().to_vec()
    }

    fn sign(&self, data: &[u8]) -> [u8; 64] {
        MemberIdentity::sign(self, data)
    }

    fn verify(&self, creator_id: &[u8], data: &[u8], signature: &[u8; 64]) -> bool {
        creator_id == self.address.as_bytes() && MemberIdentity::verify(self, data, signature)
    }
}

fn hmac_sha512(secret: &[u8], data: &[u8]) -> [u8; 64] {
    let mut mac = HmacSha512::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(data);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 64];
    out.copy_from_slice(&result);
    out
}

fn hmac_sha256(secret: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(data);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_succeeds() {
        let identity = LocalMemberIdentity::generate("a@x");
        let sig = MemberIdentity::sign(&identity, b"hello world");
        assert!(MemberIdentity::verify(&identity, b"hello world", &sig));
    }

    #[test]
    fn verify_fails_on_tampered_data() {
        let identity = LocalMemberIdentity::generate("a@x");
        let sig = MemberIdentity::sign(&identity, b"hello world");
        assert!(!MemberIdentity::verify(&identity, b"goodbye world", &sig));
    }

    #[test]
    fn sha256_sign_then_verify_succeeds() {
        let identity = LocalMemberIdentity::generate("a@x");
        let sig = identity.sign_sha256(b"hello world");
        assert!(identity.verify_sha256(b"hello world", &sig));
    }

    #[test]
    fn sha256_verify_fails_on_tampered_data() {
        let identity = LocalMemberIdentity::generate("a@x");
        let sig = identity.sign_sha256(b"hello world");
        assert!(!identity.verify_sha256(b"goodbye world", &sig));
    }

    #[test]
    fn diffie_hellman_is_symmetric() {
        let alice = LocalMemberIdentity::generate("a@x");
        let bob = LocalMemberIdentity::generate("b@x");
        let shared_a = alice.diffie_hellman(&bob.public_key());
        let shared_b = bob.diffie_hellman(&alice.public_key());
        assert_eq!(shared_a, shared_b);
    }

    #[test]
    fn round_trips_through_keyring() {
        let keyring = bc_keyring::Keyring::new(bc_keyring::KeyringConfig::Memory).unwrap();
        let identity = LocalMemberIdentity::generate("a@x");
        identity.persist_to_keyring(&keyring, "pw", 1000).unwrap();

        let reloaded = LocalMemberIdentity::load_from_keyring(&keyring, "a@x", "pw", 1001).unwrap();
        assert_eq!(reloaded.public_key().as_bytes(), identity.public_key().as_bytes());
        assert_eq!(MemberIdentity::sign(&reloaded, b"data"), MemberIdentity::sign(&identity, b"data"));
    }

    #[test]
    fn cbl_signer_rejects_wrong_creator_id() {
        let identity = LocalMemberIdentity::generate("a@x");
        let sig = CblSigner::sign(&identity, b"payload");
        assert!(!CblSigner::verify(&identity, b"b@x", b"payload", &sig));
    }
}
