/*++

Licensed under the Apache-2.0 license.

File Name:

    key_roll.rs

Abstract:

    Streaming AES-GCM decryption of partitions split in key-rolled blocks.

--*/

use sboot_drivers::{cprintln, CipherEngine, KeySource};
use sboot_error::{SbootError, SbootResult};
use sboot_image_types::{
    AesIvBytes, GcmTag, SecureHeader, SECURE_HEADER_BYTE_SIZE, SECURE_HEADER_WITH_TAG_BYTE_SIZE,
};
use zerocopy::{AsBytes, FromBytes};
use zeroize::Zeroize;

/// Plaintext staging granularity
const PLAIN_STAGE_BYTE_SIZE: usize = 256;

/// Decryption Phase
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyRollPhase {
    /// Next bytes are a secure header and its tag
    AwaitSecureHeader,

    /// Secure header split across input chunks; the carry buffer holds the
    /// bytes received so far
    PartialHeader,

    /// Ciphertext of the current block still to be decrypted
    Decrypting { remaining: u64 },

    /// Last secure header seen
    Done,
}

/// Key Rolling Decryptor
///
/// An encrypted partition is a sequence of GCM messages. The first
/// message is a secure header encrypted with the device key and the
/// partition IV. Every following message is a block of data followed by
/// the secure header carrying the key, IV and length of the next block.
/// A header announcing a zero length block ends the partition.
pub struct KeyRollingDecryptor<'a> {
    cipher: &'a mut dyn CipherEngine,
    phase: KeyRollPhase,
    key_source: KeySource,

    carry: [u8; SECURE_HEADER_WITH_TAG_BYTE_SIZE],
    carry_len: usize,

    produced: u64,
    expected: u64,
}

impl<'a> KeyRollingDecryptor<'a> {
    /// Create a decryptor and start the first message with the device key
    ///
    /// # Arguments
    ///
    /// * `cipher` - Cipher engine
    /// * `iv` - Partition IV
    /// * `expected_len` - Plaintext length announced by the partition header
    pub fn new(
        cipher: &'a mut dyn CipherEngine,
        iv: &AesIvBytes,
        expected_len: u64,
    ) -> SbootResult<Self> {
        cipher
            .load_key(KeySource::Device, None)
            .map_err(|_| SbootError::DECRYPT_KEY_LOAD_FAILURE)?;
        cipher
            .start_message(iv)
            .map_err(|_| SbootError::DECRYPT_ENGINE_FAILURE)?;

        Ok(Self {
            cipher,
            phase: KeyRollPhase::AwaitSecureHeader,
            key_source: KeySource::Device,
            carry: [0u8; SECURE_HEADER_WITH_TAG_BYTE_SIZE],
            carry_len: 0,
            produced: 0,
            expected: expected_len,
        })
    }

    pub fn phase(&self) -> KeyRollPhase {
        self.phase
    }

    /// Key slot used by the current message
    pub fn key_source(&self) -> KeySource {
        self.key_source
    }

    /// Plaintext bytes produced so far
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Decrypt the next ciphertext bytes
    ///
    /// `data` may start or end anywhere, including inside a secure header.
    /// Plaintext is passed to `output` in order; secure headers are
    /// consumed and never forwarded.
    pub fn update<F>(&mut self, mut data: &[u8], output: &mut F) -> SbootResult<()>
    where
        F: FnMut(&[u8]) -> SbootResult<()>,
    {
        while !data.is_empty() {
            match self.phase {
                KeyRollPhase::Done => {
                    cprintln!("[dec] Data after last secure header");
                    Err(SbootError::DECRYPT_IMAGE_LEN_MISMATCH)?;
                }
                KeyRollPhase::Decrypting { remaining } => {
                    let n = core::cmp::min(remaining, data.len() as u64) as usize;
                    let (block, rest) = data.split_at(n);
                    self.decrypt_block(block, output)?;
                    data = rest;

                    let remaining = remaining - n as u64;
                    self.phase = if remaining == 0 {
                        KeyRollPhase::AwaitSecureHeader
                    } else {
                        KeyRollPhase::Decrypting { remaining }
                    };
                }
                KeyRollPhase::AwaitSecureHeader | KeyRollPhase::PartialHeader => {
                    let n = core::cmp::min(SECURE_HEADER_WITH_TAG_BYTE_SIZE - self.carry_len, data.len());
                    let (head, rest) = data.split_at(n);
                    self.carry[self.carry_len..self.carry_len + n].copy_from_slice(head);
                    self.carry_len += n;
                    data = rest;

                    if self.carry_len < SECURE_HEADER_WITH_TAG_BYTE_SIZE {
                        self.phase = KeyRollPhase::PartialHeader;
                    } else {
                        self.open_secure_header()?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Check that the whole partition was decrypted
    ///
    /// # Returns
    ///
    /// * `u64` - Plaintext length
    pub fn finish(self) -> SbootResult<u64> {
        if self.phase != KeyRollPhase::Done || self.produced != self.expected {
            cprintln!(
                "[dec] Decrypted {} of {} bytes",
                self.produced,
                self.expected
            );
            Err(SbootError::DECRYPT_IMAGE_LEN_MISMATCH)?;
        }
        Ok(self.produced)
    }

    fn decrypt_block<F>(&mut self, ct: &[u8], output: &mut F) -> SbootResult<()>
    where
        F: FnMut(&[u8]) -> SbootResult<()>,
    {
        let mut stage = [0u8; PLAIN_STAGE_BYTE_SIZE];
        for piece in ct.chunks(PLAIN_STAGE_BYTE_SIZE) {
            let pt = &mut stage[..piece.len()];
            let result = self
                .cipher
                .decrypt_update(piece, pt)
                .map_err(|_| SbootError::DECRYPT_ENGINE_FAILURE)
                .and_then(|_| output(pt));
            pt.zeroize();
            result?;
            self.produced += piece.len() as u64;
        }
        Ok(())
    }

    fn open_secure_header(&mut self) -> SbootResult<()> {
        let mut header = SecureHeader::new_zeroed();
        let result = self.decrypt_secure_header(&mut header).and_then(|_| self.roll(&header));
        header.zeroize();
        self.carry.zeroize();
        self.carry_len = 0;
        result
    }

    fn decrypt_secure_header(&mut self, header: &mut SecureHeader) -> SbootResult<()> {
        let (ct, tag) = self.carry.split_at(SECURE_HEADER_BYTE_SIZE);
        let tag = GcmTag::try_from(tag).map_err(|_| SbootError::DECRYPT_ENGINE_FAILURE)?;

        self.cipher
            .decrypt_update(ct, header.as_bytes_mut())
            .map_err(|_| SbootError::DECRYPT_ENGINE_FAILURE)?;
        let tag_ok = self
            .cipher
            .finish(&tag)
            .map_err(|_| SbootError::DECRYPT_ENGINE_FAILURE)?;
        if !tag_ok {
            cprintln!("[dec] GCM tag mismatch after {} bytes", self.produced);
            Err(SbootError::DECRYPT_TAG_MISMATCH)?;
        }
        Ok(())
    }

    /// Switch to the key and IV announced by `header`
    fn roll(&mut self, header: &SecureHeader) -> SbootResult<()> {
        let next_len = header
            .next_block_len()
            .ok_or(SbootError::DECRYPT_IMAGE_LEN_MISMATCH)? as u64;

        if next_len == 0 {
            self.phase = KeyRollPhase::Done;
            self.cipher.clear_key();
            return Ok(());
        }

        if self.produced + next_len > self.expected {
            cprintln!("[dec] Next block of {} bytes overruns partition", next_len);
            Err(SbootError::DECRYPT_IMAGE_LEN_MISMATCH)?;
        }

        self.cipher
            .load_key(KeySource::KeyRolled, Some(header.key()))
            .map_err(|_| SbootError::DECRYPT_KEY_LOAD_FAILURE)?;
        self.key_source = KeySource::KeyRolled;
        self.cipher
            .start_message(header.iv())
            .map_err(|_| SbootError::DECRYPT_ENGINE_FAILURE)?;

        self.phase = KeyRollPhase::Decrypting {
            remaining: next_len,
        };
        Ok(())
    }
}

impl Drop for KeyRollingDecryptor<'_> {
    fn drop(&mut self) {
        self.carry.zeroize();
        self.cipher.clear_key();
    }
}
