/*++

Licensed under the Apache-2.0 license.

File Name:

    rsa.rs

Abstract:

    File contains the API of the RSA public key engine.

--*/

use sboot_error::SbootResult;
use sboot_image_types::{RsaBlock, RsaPublicKey};

pub trait SignatureEngine {
    /// Raw RSA public operation: `signature ^ exponent mod modulus`
    ///
    /// # Arguments
    ///
    /// * `signature` - Big-endian signature
    /// * `key` - Public key from the authentication certificate
    ///
    /// # Returns
    ///
    /// * `RsaBlock` - Big-endian result, left padded to the modulus size
    fn rsa_decrypt(&mut self, signature: &RsaBlock, key: &RsaPublicKey) -> SbootResult<RsaBlock>;
}
