/*++

Licensed under the Apache-2.0 license.

File Name:

    aes256gcm.rs

Abstract:

    File contains implementation of AES-256 GCM algorithm.

--*/

use crate::{Aes256Ctr32, AES_256_GCM_IV_SIZE, AES_256_GCM_TAG_SIZE, AES_256_KEY_SIZE};
use aes_gcm::{
    aead::{AeadMutInPlace, KeyInit},
    Key,
};

pub enum Aes256Gcm {}

impl Aes256Gcm {
    /// One-shot AES-256-GCM decryption.
    pub fn decrypt(
        key: &[u8; AES_256_KEY_SIZE],
        iv: &[u8; AES_256_GCM_IV_SIZE],
        aad: &[u8],
        tag: &[u8; AES_256_GCM_TAG_SIZE],
        ciphertext: &[u8],
    ) -> Option<Vec<u8>> {
        let key: &Key<aes_gcm::Aes256Gcm> = key.into();
        let mut cipher = aes_gcm::Aes256Gcm::new(key);
        let mut buffer = ciphertext.to_vec();
        match cipher.decrypt_in_place_detached(iv.into(), aad, &mut buffer, tag.into()) {
            Ok(_) => Some(buffer),
            Err(_) => None,
        }
    }

    /// One-shot AES-256-GCM encryption.
    pub fn encrypt(
        key: &[u8; AES_256_KEY_SIZE],
        iv: &[u8; AES_256_GCM_IV_SIZE],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Option<(Vec<u8>, [u8; AES_256_GCM_TAG_SIZE])> {
        let key: &Key<aes_gcm::Aes256Gcm> = key.into();
        let mut cipher = aes_gcm::Aes256Gcm::new(key);
        let mut buffer = plaintext.to_vec();
        match cipher.encrypt_in_place_detached(iv.into(), aad, &mut buffer) {
            Ok(tag) => Some((buffer, tag.into())),
            Err(_) => None,
        }
    }
}

/// Streaming AES-256-GCM decryption without additional data
///
/// Plaintext is released per update from the counter mode keystream; the
/// ciphertext is retained so the tag can be checked when the message ends.
pub struct Aes256GcmStream {
    key: [u8; AES_256_KEY_SIZE],
    iv: [u8; AES_256_GCM_IV_SIZE],
    ctr: Aes256Ctr32,
    ciphertext: Vec<u8>,
}

impl Aes256GcmStream {
    pub fn new(key: &[u8; AES_256_KEY_SIZE], iv: &[u8; AES_256_GCM_IV_SIZE]) -> Self {
        Self {
            key: *key,
            iv: *iv,
            ctr: Aes256Ctr32::new_gcm(iv, key),
            ciphertext: Vec::new(),
        }
    }

    /// Decrypt the next part of the message
    pub fn decrypt_update(&mut self, ciphertext: &[u8], plaintext: &mut [u8]) -> bool {
        if !self.ctr.crypt(ciphertext, plaintext) {
            return false;
        }
        self.ciphertext.extend_from_slice(ciphertext);
        true
    }

    /// End the message, returns true if `tag` is valid
    pub fn finish(self, tag: &[u8; AES_256_GCM_TAG_SIZE]) -> bool {
        Aes256Gcm::decrypt(&self.key, &self.iv, &[], tag, &self.ciphertext).is_some()
    }

    /// Bytes processed so far
    pub fn len(&self) -> usize {
        self.ciphertext.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }
}

impl Drop for Aes256GcmStream {
    fn drop(&mut self) {
        self.key.fill(0);
    }
}
