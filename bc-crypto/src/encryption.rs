// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::errors::Error;
use crate::identity::MemberIdentity;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use x25519_dalek::PublicKey;

const NONCE_LEN: usize = 12;

/// The three encryption schemes layered onto block payloads, per §4.11.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncryptionScheme {
    SharedKey,
    RecipientKeys,
    SMIME,
}

/// Result of encrypting a payload: ciphertext (with the GCM auth tag
/// appended), the shared IV, and, for the hybrid schemes, the per-recipient
/// wrapped symmetric keys and an optional sender signature.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; NONCE_LEN],
    pub encrypted_keys: HashMap<String, Vec<u8>>,
    /// `SMIME` only: HMAC-SHA256 over `SHA256(plaintext)`, per §4.11.
    pub signature: Option<[u8; 32]>,
}

/// `SharedKey`: caller supplies a 32-byte key directly.
pub fn encrypt_shared_key(key: &[u8; 32], plaintext: &[u8]) -> Result<EncryptedPayload, Error> {
    let iv = random_nonce();
    let ciphertext = aes_gcm_encrypt(key, &iv, plaintext)?;
    Ok(EncryptedPayload {
        ciphertext,
        iv,
        encrypted_keys: HashMap::new(),
        signature: None,
    })
}

pub fn decrypt_shared_key(key: &[u8; 32], payload: &EncryptedPayload) -> Result<Vec<u8>, Error> {
    aes_gcm_decrypt(key, &payload.iv, &payload.ciphertext)
}

/// `RecipientKeys`: a fresh content key encrypts the payload once; the
/// content key is then wrapped under an x25519 shared secret per recipient.
pub fn encrypt_recipient_keys<I: MemberIdentity>(
    sender: &I,
    recipient_public_keys: &HashMap<String, PublicKey>,
    plaintext: &[u8],
) -> Result<EncryptedPayload, Error> {
    if recipient_public_keys.is_empty() {
        return Err(Error::EncryptionRequiresKeys);
    }
    let mut content_key = [0u8; 32];
    OsRng.fill_bytes(&mut content_key);

    let iv = random_nonce();
    let ciphertext = aes_gcm_encrypt(&content_key, &iv, plaintext)?;

    let mut encrypted_keys = HashMap::new();
    for (address, public_key) in recipient_public_keys {
        let shared_secret = sender.diffie_hellman(public_key);
        let wrap_key = derive_wrap_key(&shared_secret);
        let wrap_iv = random_nonce();
        let mut wrapped = aes_gcm_encrypt(&wrap_key, &wrap_iv, &content_key)?;
        let mut entry = wrap_iv.to_vec();
        entry.append(&mut wrapped);
        encrypted_keys.insert(address.clone(), entry);
    }

    Ok(EncryptedPayload {
        ciphertext,
        iv,
        encrypted_keys,
        signature: None,
    })
}

/// Recovers the content key for `recipient_address` via `recipient`'s
/// shared secret with `sender_public`, then decrypts the payload.
pub fn decrypt_recipient_keys<I: MemberIdentity>(
    recipient: &I,
    recipient_address: &str,
    sender_public: &PublicKey,
    payload: &EncryptedPayload,
) -> Result<Vec<u8>, Error> {
    let wrapped_entry = payload
        .encrypted_keys
        .get(recipient_address)
        .ok_or_else(|| Error::UnknownRecipient(recipient_address.to_string()))?;
    if wrapped_entry.len() < NONCE_LEN {
        return Err(Error::DecryptionFailed);
    }
    let (wrap_iv, wrapped_key) = wrapped_entry.split_at(NONCE_LEN);
    let shared_secret = recipient.diffie_hellman(sender_public);
    let wrap_key = derive_wrap_key(&shared_secret);
    let mut wrap_iv_arr = [0u8; NONCE_LEN];
    wrap_iv_arr.copy_from_slice(wrap_iv);
    let content_key_bytes = aes_gcm_decrypt(&wrap_key, &wrap_iv_arr, wrapped_key)?;
    if content_key_bytes.len() != 32 {
        return Err(Error::DecryptionFailed);
    }
    let mut content_key = [0u8; 32];
    content_key.copy_from_slice(&content_key_bytes);
    aes_gcm_decrypt(&content_key, &payload.iv, &payload.ciphertext)
}

/// `SMIME`: `RecipientKeys` plus a sender signature over `SHA256(plaintext)`,
/// using HMAC-SHA256 (spec §4.11) — distinct from the HMAC-SHA512 primitive
/// `MemberIdentity::sign` uses for CBL header signatures.
pub fn encrypt_smime<I: MemberIdentity>(
    sender: &I,
    recipient_public_keys: &HashMap<String, PublicKey>,
    plaintext: &[u8],
) -> Result<EncryptedPayload, Error> {
    let mut payload = encrypt_recipient_keys(sender, recipient_public_keys, plaintext)?;
    let digest = Sha256::digest(plaintext);
    payload.signature = Some(sender.sign_sha256(&digest));
    Ok(payload)
}

/// Verifies the sender's `SMIME` signature over the recovered plaintext.
pub fn verify_smime_signature<I: MemberIdentity>(sender: &I, plaintext: &[u8], payload: &EncryptedPayload) -> Result<(), Error> {
    let signature = payload.signature.ok_or(Error::SignatureInvalid)?;
    let digest = Sha256::digest(plaintext);
    if sender.verify_sha256(&digest, &signature) {
        Ok(())
    } else {
        Err(Error::SignatureInvalid)
    }
}

fn derive_wrap_key(shared_secret: &[u8; 32]) -> [u8; 32] {
    let digest = Sha256::digest(shared_secret);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

fn random_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

fn aes_gcm_encrypt(key: &[u8; 32], iv: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .encrypt(Nonce::from_slice(iv), plaintext)
        .map_err(|_| Error::EncryptionRequiresKeys)
}

fn aes_gcm_decrypt(key: &[u8; 32], iv: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| Error::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::LocalMemberIdentity;

    #[test]
    fn shared_key_round_trips() {
        let key = [7u8; 32];
        let payload = encrypt_shared_key(&key, b"hello").unwrap();
        let plaintext = decrypt_shared_key(&key, &payload).unwrap();
        assert_eq!(plaintext, b"hello");
    }

    #[test]
    fn shared_key_wrong_key_fails() {
        let payload = encrypt_shared_key(&[7u8; 32], b"hello").unwrap();
        assert!(matches!(decrypt_shared_key(&[9u8; 32], &payload), Err(Error::DecryptionFailed)));
    }

    #[test]
    fn recipient_keys_round_trips_for_each_recipient() {
        let sender = LocalMemberIdentity::generate("a@x");
        let bob = LocalMemberIdentity::generate("b@x");
        let carol = LocalMemberIdentity::generate("c@x");

        let mut recipients = HashMap::new();
        recipients.insert("b@x".to_string(), bob.public_key());
        recipients.insert("c@x".to_string(), carol.public_key());

        let payload = encrypt_recipient_keys(&sender, &recipients, b"payload body").unwrap();

        let for_bob = decrypt_recipient_keys(&bob, "b@x", &sender.public_key(), &payload).unwrap();
        assert_eq!(for_bob, b"payload body");
        let for_carol = decrypt_recipient_keys(&carol, "c@x", &sender.public_key(), &payload).unwrap();
        assert_eq!(for_carol, b"payload body");
    }

    #[test]
    fn recipient_keys_rejects_unlisted_recipient() {
        let sender = LocalMemberIdentity::generate("a@x");
        let bob = LocalMemberIdentity::generate("b@x");
        let mut recipients = HashMap::new();
        recipients.insert("b@x".to_string(), bob.public_key());
        let payload = encrypt_recipient_keys(&sender, &recipients, b"payload").unwrap();

        let eve = LocalMemberIdentity::generate("eve@x");
        assert!(matches!(
            decrypt_recipient_keys(&eve, "eve@x", &sender.public_key(), &payload),
            Err(Error::UnknownRecipient(_))
        ));
    }

    #[test]
    fn recipient_keys_requires_at_least_one_recipient() {
        let sender = LocalMemberIdentity::generate("a@x");
        assert!(matches!(
            encrypt_recipient_keys(&sender, &HashMap::new(), b"payload"),
            Err(Error::EncryptionRequiresKeys)
        ));
    }

    #[test]
    fn smime_signature_verifies_over_recovered_plaintext() {
        let sender = LocalMemberIdentity::generate("a@x");
        let bob = LocalMemberIdentity::generate("b@x");
        let mut recipients = HashMap::new();
        recipients.insert("b@x".to_string(), bob.public_key());

        let payload = encrypt_smime(&sender, &recipients, b"signed body").unwrap();
        let plaintext = decrypt_recipient_keys(&bob, "b@x", &sender.public_key(), &payload).unwrap();
        verify_smime_signature(&sender, &plaintext, &payload).unwrap();
    }

    #[test]
    fn smime_signature_fails_on_tampered_plaintext() {
        let sender = LocalMemberIdentity::generate("a@x");
        let bob = LocalMemberIdentity::generate("b@x");
        let mut recipients = HashMap::new();
        recipients.insert("b@x".to_string(), bob.public_key());

        let payload = encrypt_smime(&sender, &recipients, b"signed body").unwrap();
        assert!(matches!(
            verify_smime_signature(&sender, b"tampered body", &payload),
            Err(Error::SignatureInvalid)
        ));
    }
}
