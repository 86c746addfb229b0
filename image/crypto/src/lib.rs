/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains crypto utilities needed to generate images.

--*/

mod rustcrypto;

use std::path::Path;

use anyhow::{bail, Context};
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};
use sboot_image_gen::ImageRsaPrivKey;
use sboot_image_types::{RsaBlock, RSA_KEY_BYTE_SIZE};

pub use rustcrypto::RustCrypto;

/// Parse a 4096-bit PKCS#8 PEM private key
pub fn rsa_priv_key_from_pem(pem: &str) -> anyhow::Result<ImageRsaPrivKey> {
    let key = RsaPrivateKey::from_pkcs8_pem(pem).context("Failed to parse RSA private key")?;

    let e = key.e().to_bytes_be();
    if e.len() > 4 {
        bail!("RSA public exponent does not fit in 32 bits");
    }
    let public_exponent = e.iter().fold(0u32, |acc, b| acc << 8 | *b as u32);

    Ok(ImageRsaPrivKey {
        modulus: to_rsa_block(key.n())?,
        public_exponent,
        private_exponent: to_rsa_block(key.d())?,
    })
}

/// Read and parse a PKCS#8 PEM private key file
pub fn rsa_priv_key_from_pem_file(path: &Path) -> anyhow::Result<ImageRsaPrivKey> {
    let pem = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read private key PEM file {}", path.display()))?;
    rsa_priv_key_from_pem(&pem)
        .with_context(|| format!("Invalid private key PEM file {}", path.display()))
}

/// Big-endian, left padded to the RSA block size
pub(crate) fn to_rsa_block(value: &BigUint) -> anyhow::Result<RsaBlock> {
    let bytes = value.to_bytes_be();
    if bytes.len() > RSA_KEY_BYTE_SIZE {
        bail!("Value of {} bytes exceeds RSA-4096", bytes.len());
    }
    let mut block = [0u8; RSA_KEY_BYTE_SIZE];
    block[RSA_KEY_BYTE_SIZE - bytes.len()..].copy_from_slice(&bytes);
    Ok(block)
}
