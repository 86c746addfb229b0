/*++

Licensed under the Apache-2.0 license.

File Name:

   encrypt.rs

Abstract:

    Key rolling encryption of partition payloads.

--*/

use anyhow::bail;
use rand::RngCore;
use sboot_image_types::*;
use zerocopy::AsBytes;

use crate::ImageGeneratorCrypto;

/// Encrypt `payload` as a chain of key rolled GCM messages
///
/// The first message holds only the secure header for the first block and
/// is encrypted with `device_key`. Every block is encrypted together with
/// the secure header of the next one under a fresh random key and IV. The
/// last secure header announces a zero length block.
///
/// # Arguments
///
/// * `crypto` - Crypto provider
/// * `rng` - Source of the rolled keys and IVs
/// * `device_key` - Device key
/// * `iv` - Partition IV
/// * `payload` - Plaintext, word aligned
/// * `block_len` - Plaintext bytes per block, zero for a single block
pub fn key_roll_encrypt<C, R>(
    crypto: &C,
    rng: &mut R,
    device_key: &AesKeyBytes,
    iv: &AesIvBytes,
    payload: &[u8],
    block_len: usize,
) -> anyhow::Result<Vec<u8>>
where
    C: ImageGeneratorCrypto,
    R: RngCore,
{
    let word = WORD_BYTE_SIZE as usize;
    if payload.is_empty() || payload.len() % word != 0 {
        bail!("Encrypted payload must be a non-empty multiple of {word} bytes");
    }
    if block_len % word != 0 {
        bail!("Key rolling block length {block_len} is not word aligned");
    }
    let block_len = if block_len == 0 {
        payload.len()
    } else {
        block_len
    };

    let mut out = Vec::new();
    let mut key = *device_key;
    let mut msg_iv = *iv;
    let mut message: Vec<u8> = Vec::new();

    for block in payload.chunks(block_len) {
        let mut next_key = AesKeyBytes::default();
        let mut next_iv = AesIvBytes::default();
        rng.fill_bytes(&mut next_key);
        rng.fill_bytes(&mut next_iv);

        message.extend_from_slice(secure_header(&next_key, &next_iv, block.len())?.as_bytes());
        seal(crypto, &key, &msg_iv, &message, &mut out)?;

        message = block.to_vec();
        key = next_key;
        msg_iv = next_iv;
    }

    let last = secure_header(&AesKeyBytes::default(), &AesIvBytes::default(), 0)?;
    message.extend_from_slice(last.as_bytes());
    seal(crypto, &key, &msg_iv, &message, &mut out)?;

    Ok(out)
}

fn secure_header(key: &AesKeyBytes, iv: &AesIvBytes, len: usize) -> anyhow::Result<SecureHeader> {
    let words = u32::try_from(len / WORD_BYTE_SIZE as usize)?;
    let mut header = SecureHeader::default();
    header.set_key(*key).set_iv(*iv).set_next_block_word_len(words);
    Ok(header)
}

fn seal<C: ImageGeneratorCrypto>(
    crypto: &C,
    key: &AesKeyBytes,
    iv: &AesIvBytes,
    plaintext: &[u8],
    out: &mut Vec<u8>,
) -> anyhow::Result<()> {
    let (ct, tag) = crypto.aes_gcm_encrypt(key, iv, plaintext)?;
    out.extend_from_slice(&ct);
    out.extend_from_slice(&tag);
    Ok(())
}
