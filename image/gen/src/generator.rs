/*++

Licensed under the Apache-2.0 license.

File Name:

   generator.rs

Abstract:

    Boot image generator

--*/
use anyhow::{bail, Context};
use rand::RngCore;
use sboot_image_types::*;
use zerocopy::AsBytes;

use crate::*;

/// Bytes reserved for the boot header
const BOOT_HEADER_AREA_BYTE_SIZE: usize = 0x40;

/// Alignment of partition data
const PARTITION_ALIGN: usize = 64;

const AUTH_CERT_HEADER: u32 = 0x0101_0000;

/// Certificate fields shared by every partition of an image
struct CertTemplate<'a> {
    cert: AuthCertificate,
    spk: &'a ImageRsaPrivKey,
}

/// Image generator
pub struct ImageGenerator<Crypto: ImageGeneratorCrypto> {
    crypto: Crypto,
}

impl<Crypto: ImageGeneratorCrypto> ImageGenerator<Crypto> {
    /// Create an instance `ImageGenerator`
    pub fn new(crypto: Crypto) -> Self {
        Self { crypto }
    }

    /// Generate image
    ///
    /// # Arguments
    ///
    /// * `config` - Image generator configuration
    /// * `rng` - Source of the rolled AES keys
    ///
    /// # Returns
    ///
    /// * `Vec<u8>` - Boot image starting with the boot header
    pub fn generate<R: RngCore>(
        &self,
        config: &ImageGeneratorConfig,
        rng: &mut R,
    ) -> anyhow::Result<Vec<u8>> {
        let count = config.partitions.len();
        if count == 0 || count > MAX_PARTITIONS as usize {
            bail!("Partition count {count} outside 1..={MAX_PARTITIONS}");
        }

        let boot_header = self.gen_boot_header(config)?;
        let template = match &config.keys {
            Some(keys) => Some(self.cert_template(config, keys, &boot_header)?),
            None => None,
        };

        let headers_end = BOOT_HEADER_AREA_BYTE_SIZE + count * PARTITION_HEADER_BYTE_SIZE;
        let mut image = vec![0u8; headers_end];
        image[..BOOT_HEADER_BYTE_SIZE].copy_from_slice(boot_header.as_bytes());

        let mut headers = Vec::with_capacity(count);
        for (index, partition) in config.partitions.iter().enumerate() {
            align(&mut image);
            let header = self
                .gen_partition(config, template.as_ref(), partition, &mut image, rng)
                .with_context(|| format!("Partition {index}"))?;
            headers.push(header);
        }

        for (index, header) in headers.iter_mut().enumerate() {
            let next = if index + 1 < count {
                words(partition_header_offset(index + 1))?
            } else {
                0
            };
            header.set_next_partition_header_word_offset(next);
            header.set_checksum(header.calc_checksum());

            let offset = partition_header_offset(index);
            image[offset..offset + PARTITION_HEADER_BYTE_SIZE].copy_from_slice(header.as_bytes());
        }

        Ok(image)
    }

    /// Create the boot header
    pub fn gen_boot_header(&self, config: &ImageGeneratorConfig) -> anyhow::Result<BootHeader> {
        let attributes = match config.hash_alg {
            HashAlgorithm::Sha3_384 => 0,
            HashAlgorithm::Sha2_256 => IMAGE_ATTRIBUTE_SHA2_MASK,
        };

        let mut header = BootHeader::default();
        header
            .set_marker(BOOT_HEADER_MARKER)
            .set_size(BOOT_HEADER_BYTE_SIZE as u32)
            .set_image_attributes(attributes)
            .set_iv(config.boot_iv)
            .set_partition_count(config.partitions.len() as u32)
            .set_partition_header_word_offset(words(BOOT_HEADER_AREA_BYTE_SIZE)?);
        header.set_checksum(header.calc_checksum());
        Ok(header)
    }

    /// SHA3-384 digest of the PPK, as provisioned in the device
    pub fn ppk_digest(&self, keys: &ImageGeneratorKeys) -> anyhow::Result<Digest> {
        let ppk = self.crypto.rsa_pub_key(&keys.ppk)?;
        self.crypto.digest(HashAlgorithm::Sha3_384, ppk.as_bytes())
    }

    fn cert_template<'a>(
        &self,
        config: &ImageGeneratorConfig,
        keys: &'a ImageGeneratorKeys,
        boot_header: &BootHeader,
    ) -> anyhow::Result<CertTemplate<'a>> {
        let alg = config.hash_alg;
        let mut cert = AuthCertificate::default();
        cert.set_auth_header(AUTH_CERT_HEADER)
            .set_spk_id(keys.spk_id)
            .set_ppk(self.crypto.rsa_pub_key(&keys.ppk)?)
            .set_spk(self.crypto.rsa_pub_key(&keys.spk)?);

        let mut spk_data = Vec::new();
        for range in [
            AuthCertificate::selector_range(),
            AuthCertificate::ppk_range(),
            AuthCertificate::spk_range(),
        ] {
            spk_data.extend_from_slice(cert.bytes(range).context("certificate range")?);
        }
        let spk_digest = self.crypto.digest(alg, &spk_data)?;
        cert.set_spk_signature(self.crypto.rsa_sign(alg, &spk_digest, &keys.ppk)?);

        let header_digest = self.crypto.digest(alg, boot_header.as_bytes())?;
        cert.set_boot_header_signature(self.crypto.rsa_sign(alg, &header_digest, &keys.spk)?);

        Ok(CertTemplate {
            cert,
            spk: &keys.spk,
        })
    }

    /// Certificate signing `data`
    fn gen_cert(
        &self,
        alg: HashAlgorithm,
        template: &CertTemplate,
        data: &[u8],
    ) -> anyhow::Result<AuthCertificate> {
        let mut cert = template.cert;
        let mut signed = data.to_vec();
        signed.extend_from_slice(
            cert.bytes(AuthCertificate::signed_range())
                .context("certificate range")?,
        );
        let digest = self.crypto.digest(alg, &signed)?;
        cert.set_partition_signature(self.crypto.rsa_sign(alg, &digest, template.spk)?);
        Ok(cert)
    }

    fn gen_partition<R: RngCore>(
        &self,
        config: &ImageGeneratorConfig,
        template: Option<&CertTemplate>,
        partition: &ImageGeneratorPartition,
        image: &mut Vec<u8>,
        rng: &mut R,
    ) -> anyhow::Result<PartitionHeader> {
        let mut attr = PartitionAttributes::default();
        attr.set_dest_cpu(partition.dest_cpu.into());
        attr.set_dest_device(partition.dest_device.into());
        attr.set_owner(partition.owner.into());
        attr.set_aarch32(partition.aarch32);
        attr.set_encrypted(partition.encrypt);
        attr.set_rsa_signature(partition.authenticate);
        attr.set_block_size_code(partition.block_size_code);
        if partition.checksum {
            attr.set_checksum_type(ChecksumType::Sha3.into());
        }

        let mut header = PartitionHeader::default();
        header
            .set_attributes(attr)
            .set_load_addr(partition.load_addr)
            .set_exec_addr(partition.exec_addr);
        header
            .set_section_count(1)
            .set_iv_word(partition.iv_fragment as u32);

        if partition.execute_in_place {
            return Ok(header);
        }

        let mut payload = partition.payload.clone();
        payload.resize(payload.len().next_multiple_of(WORD_BYTE_SIZE as usize), 0);

        let data = if partition.encrypt {
            let device_key = config
                .device_key
                .as_ref()
                .context("Encrypted partition without device key")?;
            let iv = partition_iv(&config.boot_iv, partition.iv_fragment);
            key_roll_encrypt(
                &self.crypto,
                rng,
                device_key,
                &iv,
                &payload,
                partition.key_roll_block_len,
            )?
        } else {
            payload.clone()
        };

        header
            .set_data_word_offset(words(image.len())?)
            .set_encrypted_data_word_len(words(data.len())?)
            .set_unencrypted_data_word_len(words(payload.len())?);
        image.extend_from_slice(&data);
        let mut total = data.len();

        if partition.authenticate {
            let template = template.context("Authenticated partition without keys")?;
            header.set_auth_cert_word_offset(words(image.len())?);

            let block_size = attr.block_size() as usize;
            let blocks: Vec<&[u8]> = if partition.dest_device == DestinationDevice::Pl && block_size != 0 {
                data.chunks(block_size).collect()
            } else {
                vec![&data[..]]
            };
            for block in blocks {
                let cert = self.gen_cert(config.hash_alg, template, block)?;
                image.extend_from_slice(cert.as_bytes());
                total += AUTH_CERT_BYTE_SIZE;
            }
        }

        if partition.checksum {
            let checksum = self.crypto.digest(HashAlgorithm::Sha3_384, &data)?;
            header.set_checksum_word_offset(words(image.len())?);
            image.extend_from_slice(checksum.as_bytes());
        }

        header.set_total_data_word_len(words(total)?);
        Ok(header)
    }
}

fn partition_header_offset(index: usize) -> usize {
    BOOT_HEADER_AREA_BYTE_SIZE + index * PARTITION_HEADER_BYTE_SIZE
}

fn align(image: &mut Vec<u8>) {
    let len = image.len().next_multiple_of(PARTITION_ALIGN);
    image.resize(len, 0);
}

fn words(len: usize) -> anyhow::Result<u32> {
    if len % WORD_BYTE_SIZE as usize != 0 {
        bail!("Length {len} is not word aligned");
    }
    Ok(u32::try_from(len / WORD_BYTE_SIZE as usize)?)
}
