/*++

Licensed under the Apache-2.0 license.

File Name:

    aes.rs

Abstract:

    File contains the API of the AES-256-GCM decryption engine.

--*/

use sboot_error::SbootResult;
use sboot_image_types::{AesIvBytes, AesKeyBytes, GcmTag};

/// AES key slot
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeySource {
    /// Device key, never visible to software
    Device,

    /// Key-rolled (key update) slot loaded from a decrypted secure header
    KeyRolled,
}

/// Streaming AES-256-GCM decryption
///
/// One GCM message is `start_message`, any number of `decrypt_update` calls
/// and `finish`. Plaintext produced before `finish` is unauthenticated.
pub trait CipherEngine {
    /// Select the key slot; `key` is required for `KeySource::KeyRolled`
    fn load_key(&mut self, source: KeySource, key: Option<&AesKeyBytes>) -> SbootResult<()>;

    /// Begin a GCM message with `iv` and the loaded key
    fn start_message(&mut self, iv: &AesIvBytes) -> SbootResult<()>;

    /// Decrypt `ct` into `pt`; both slices have the same length
    fn decrypt_update(&mut self, ct: &[u8], pt: &mut [u8]) -> SbootResult<()>;

    /// End the message, returns true if `tag` authenticates it
    fn finish(&mut self, tag: &GcmTag) -> SbootResult<bool>;

    /// Clear the key-rolled slot
    fn clear_key(&mut self);

    /// Decrypt a complete message
    fn decrypt(
        &mut self,
        iv: &AesIvBytes,
        ct: &[u8],
        pt: &mut [u8],
        tag: &GcmTag,
    ) -> SbootResult<bool> {
        self.start_message(iv)?;
        self.decrypt_update(ct, pt)?;
        self.finish(tag)
    }
}
