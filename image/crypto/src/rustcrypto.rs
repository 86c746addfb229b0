/*++

Licensed under the Apache-2.0 license.

File Name:

   rustcrypto.rs

Abstract:

    Image generator crypto provider backed by the RustCrypto crates.

--*/

use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use anyhow::{anyhow, bail};
use rsa::BigUint;
use sboot_image_gen::{ImageGeneratorCrypto, ImageRsaPrivKey};
use sboot_image_types::*;
use sha2::Sha256;
use sha3::{Digest as _, Sha3_384};

use crate::to_rsa_block;

/// Bits of the Montgomery radix squared, R = 2^4096
const MONTGOMERY_R2_BITS: usize = 2 * RSA_KEY_BYTE_SIZE * 8;

#[derive(Default)]
pub struct RustCrypto {}

impl ImageGeneratorCrypto for RustCrypto {
    fn digest(&self, alg: HashAlgorithm, data: &[u8]) -> anyhow::Result<Digest> {
        let digest = match alg {
            HashAlgorithm::Sha3_384 => Digest::from_slice(&Sha3_384::digest(data)),
            HashAlgorithm::Sha2_256 => Digest::from_slice(&Sha256::digest(data)),
        };
        digest.ok_or(anyhow!("Digest length mismatch"))
    }

    fn rsa_sign(
        &self,
        alg: HashAlgorithm,
        digest: &Digest,
        priv_key: &ImageRsaPrivKey,
    ) -> anyhow::Result<RsaBlock> {
        let encoded = pkcs1_v15_encode(alg, digest.as_bytes())
            .ok_or(anyhow!("Digest does not match {alg:?}"))?;

        let n = BigUint::from_bytes_be(&priv_key.modulus);
        let d = BigUint::from_bytes_be(&priv_key.private_exponent);
        let m = BigUint::from_bytes_be(&encoded);
        if m >= n {
            bail!("Encoded digest exceeds modulus");
        }
        to_rsa_block(&m.modpow(&d, &n))
    }

    fn rsa_pub_key(&self, priv_key: &ImageRsaPrivKey) -> anyhow::Result<RsaPublicKey> {
        let n = BigUint::from_bytes_be(&priv_key.modulus);
        if n == BigUint::from(0u32) {
            bail!("RSA modulus is zero");
        }
        let r2 = (BigUint::from(1u32) << MONTGOMERY_R2_BITS) % &n;

        let mut key = RsaPublicKey::default();
        key.set_modulus(priv_key.modulus)
            .set_modulus_ext(to_rsa_block(&r2)?)
            .set_exponent(priv_key.public_exponent);
        Ok(key)
    }

    fn aes_gcm_encrypt(
        &self,
        key: &AesKeyBytes,
        iv: &AesIvBytes,
        plaintext: &[u8],
    ) -> anyhow::Result<(Vec<u8>, GcmTag)> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| anyhow!("Invalid AES key"))?;
        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(iv), &[], &mut buffer)
            .map_err(|_| anyhow!("AES-GCM encryption failed"))?;

        let mut out = [0u8; GCM_TAG_BYTE_SIZE];
        out.copy_from_slice(tag.as_slice());
        Ok((buffer, out))
    }
}
