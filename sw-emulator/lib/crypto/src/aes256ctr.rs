/*++

Licensed under the Apache-2.0 license.

File Name:

    aes256ctr.rs

Abstract:

    File contains implementation of the AES-256 CTR keystream used by GCM

--*/

use crate::{AES_256_BLOCK_SIZE, AES_256_GCM_IV_SIZE, AES_256_KEY_SIZE};
use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};

type Ctr = ctr::Ctr32BE<Aes256>;

/// GCM counter mode: 96-bit IV, 32-bit big-endian block counter
pub struct Aes256Ctr32 {
    cryptor: Ctr,
}

impl Aes256Ctr32 {
    /// Keystream of a GCM message; the first data block uses counter 2
    pub fn new_gcm(iv: &[u8; AES_256_GCM_IV_SIZE], key: &[u8; AES_256_KEY_SIZE]) -> Self {
        let mut block = [0u8; AES_256_BLOCK_SIZE];
        block[..AES_256_GCM_IV_SIZE].copy_from_slice(iv);
        block[AES_256_BLOCK_SIZE - 1] = 2;
        Self {
            cryptor: Ctr::new(key.into(), (&block).into()),
        }
    }

    /// Streaming mode: encrypt or decrypt `input` into `output`
    ///
    /// Partial blocks are continued by the next call.
    pub fn crypt(&mut self, input: &[u8], output: &mut [u8]) -> bool {
        if input.len() != output.len() {
            return false;
        }
        output.copy_from_slice(input);
        self.cryptor.apply_keystream(output);
        true
    }
}
