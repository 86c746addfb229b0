/*++

Licensed under the Apache-2.0 license.

File Name:

    aes.rs

Abstract:

    File contains the emulated AES-256-GCM engine with a device key slot
    and a key-rolled slot.

--*/

use sboot_drivers::{CipherEngine, KeySource};
use sboot_emu_crypto::Aes256GcmStream;
use sboot_error::{SbootError, SbootResult};
use sboot_image_types::{AesIvBytes, AesKeyBytes, GcmTag};
use zeroize::Zeroize;

#[derive(Default)]
pub struct EmuCipher {
    device_key: Option<AesKeyBytes>,
    rolled_key: Option<AesKeyBytes>,
    selected: Option<KeySource>,
    stream: Option<Aes256GcmStream>,

    /// Key slot selected for every message, in order
    pub message_keys: Vec<KeySource>,

    /// Number of `clear_key` calls
    pub clears: usize,
}

impl EmuCipher {
    /// Create an engine with `device_key` provisioned
    pub fn new(device_key: Option<AesKeyBytes>) -> Self {
        Self {
            device_key,
            ..Default::default()
        }
    }

    pub fn has_rolled_key(&self) -> bool {
        self.rolled_key.is_some()
    }

    fn key(&self) -> SbootResult<&AesKeyBytes> {
        match self.selected {
            Some(KeySource::Device) => self.device_key.as_ref(),
            Some(KeySource::KeyRolled) => self.rolled_key.as_ref(),
            None => None,
        }
        .ok_or(SbootError::DRIVER_CIPHER_INVALID_STATE)
    }
}

impl CipherEngine for EmuCipher {
    fn load_key(&mut self, source: KeySource, key: Option<&AesKeyBytes>) -> SbootResult<()> {
        match (source, key) {
            (KeySource::Device, _) => {
                if self.device_key.is_none() {
                    Err(SbootError::DRIVER_CIPHER_INVALID_STATE)?;
                }
            }
            (KeySource::KeyRolled, Some(key)) => self.rolled_key = Some(*key),
            (KeySource::KeyRolled, None) => Err(SbootError::DRIVER_CIPHER_INVALID_STATE)?,
        }
        self.selected = Some(source);
        Ok(())
    }

    fn start_message(&mut self, iv: &AesIvBytes) -> SbootResult<()> {
        let key = self.key()?;
        self.stream = Some(Aes256GcmStream::new(key, iv));
        if let Some(source) = self.selected {
            self.message_keys.push(source);
        }
        Ok(())
    }

    fn decrypt_update(&mut self, ct: &[u8], pt: &mut [u8]) -> SbootResult<()> {
        if ct.len() != pt.len() {
            Err(SbootError::DRIVER_CIPHER_LENGTH_MISMATCH)?;
        }
        let stream = self
            .stream
            .as_mut()
            .ok_or(SbootError::DRIVER_CIPHER_INVALID_STATE)?;
        if !stream.decrypt_update(ct, pt) {
            Err(SbootError::DRIVER_CIPHER_LENGTH_MISMATCH)?;
        }
        Ok(())
    }

    fn finish(&mut self, tag: &GcmTag) -> SbootResult<bool> {
        let stream = self
            .stream
            .take()
            .ok_or(SbootError::DRIVER_CIPHER_INVALID_STATE)?;
        Ok(stream.finish(tag))
    }

    fn clear_key(&mut self) {
        if let Some(mut key) = self.rolled_key.take() {
            key.zeroize();
        }
        if self.selected == Some(KeySource::KeyRolled) {
            self.selected = None;
        }
        self.stream = None;
        self.clears += 1;
    }
}
