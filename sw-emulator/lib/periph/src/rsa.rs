/*++

Licensed under the Apache-2.0 license.

File Name:

    rsa.rs

Abstract:

    File contains the emulated RSA public key engine.

--*/

use sboot_drivers::SignatureEngine;
use sboot_emu_crypto::RsaPublicOp;
use sboot_error::{SbootError, SbootResult};
use sboot_image_types::{RsaBlock, RsaPublicKey};

#[derive(Default)]
pub struct EmuRsa {
    /// Number of public key operations performed
    pub operations: usize,
}

impl SignatureEngine for EmuRsa {
    fn rsa_decrypt(&mut self, signature: &RsaBlock, key: &RsaPublicKey) -> SbootResult<RsaBlock> {
        self.operations += 1;
        RsaPublicOp::apply(key.modulus(), key.exponent(), signature)
            .ok_or(SbootError::DRIVER_RSA_INVALID_KEY)
    }
}
