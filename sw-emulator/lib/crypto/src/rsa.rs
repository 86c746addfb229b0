/*++

Licensed under the Apache-2.0 license.

File Name:

    rsa.rs

Abstract:

    File contains the RSA-4096 public key operation

--*/

use crate::RSA_4096_BYTE_SIZE;
use rsa::BigUint;

pub enum RsaPublicOp {}

impl RsaPublicOp {
    /// Compute `signature ^ exponent mod modulus`
    ///
    /// Inputs are big-endian. Returns `None` for a zero modulus or exponent,
    /// or a signature not reduced modulo the modulus.
    pub fn apply(
        modulus: &[u8],
        exponent: u32,
        signature: &[u8],
    ) -> Option<[u8; RSA_4096_BYTE_SIZE]> {
        let n = BigUint::from_bytes_be(modulus);
        let s = BigUint::from_bytes_be(signature);
        let e = BigUint::from(exponent);
        if n == BigUint::from(0u32) || exponent == 0 || s >= n {
            return None;
        }

        let m = s.modpow(&e, &n).to_bytes_be();
        let mut out = [0u8; RSA_4096_BYTE_SIZE];
        let start = RSA_4096_BYTE_SIZE.checked_sub(m.len())?;
        out[start..].copy_from_slice(&m);
        Some(out)
    }
}
