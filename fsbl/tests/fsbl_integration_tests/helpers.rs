// Licensed under the Apache-2.0 license

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use sboot_emu_periph::{EmuSoc, SocArgs};
use sboot_error::SbootResult;
use sboot_fsbl::{LoadSummary, LoaderConfig, LoaderEnv, PartitionLoader};
use sboot_image_crypto::{rsa_priv_key_from_pem, RustCrypto};
use sboot_image_fake_keys::{
    BOOT_IV, DEVICE_AES_KEY, PPK_PRIVATE_PEM, SPK_ALT_PRIVATE_PEM, SPK_PRIVATE_PEM,
};
use sboot_image_gen::{
    ImageGenerator, ImageGeneratorConfig, ImageGeneratorKeys, ImageGeneratorPartition,
};
use sboot_image_types::{Digest, PartitionHeader, PARTITION_HEADER_BYTE_SIZE};
use zerocopy::FromBytes;

pub const DDR_LOAD_ADDR: u64 = 0x10_0000;

/// Digest slots available to block authentication
const HASH_STORE_SLOTS: usize = 64;

/// Offset of the first partition header written by the generator
const FIRST_PARTITION_HEADER: usize = 0x40;

pub fn keys() -> ImageGeneratorKeys {
    ImageGeneratorKeys {
        ppk: rsa_priv_key_from_pem(PPK_PRIVATE_PEM).unwrap(),
        spk: rsa_priv_key_from_pem(SPK_PRIVATE_PEM).unwrap(),
        spk_id: 1,
    }
}

/// Keys whose PPK is not the provisioned one
pub fn foreign_keys() -> ImageGeneratorKeys {
    ImageGeneratorKeys {
        ppk: rsa_priv_key_from_pem(SPK_ALT_PRIVATE_PEM).unwrap(),
        spk: rsa_priv_key_from_pem(SPK_PRIVATE_PEM).unwrap(),
        spk_id: 1,
    }
}

pub fn ppk_digest() -> Digest {
    ImageGenerator::new(RustCrypto::default())
        .ppk_digest(&keys())
        .unwrap()
}

/// Deterministic payload of `len` bytes
pub fn payload(len: usize, seed: u64) -> Vec<u8> {
    let mut data = vec![0u8; len];
    StdRng::seed_from_u64(seed).fill_bytes(&mut data);
    data
}

pub fn image_config(partitions: Vec<ImageGeneratorPartition>) -> ImageGeneratorConfig {
    ImageGeneratorConfig {
        boot_iv: BOOT_IV,
        device_key: Some(DEVICE_AES_KEY),
        keys: Some(keys()),
        partitions,
        ..Default::default()
    }
}

pub fn build_image(config: &ImageGeneratorConfig) -> Vec<u8> {
    ImageGenerator::new(RustCrypto::default())
        .generate(config, &mut StdRng::seed_from_u64(0x1A6E))
        .unwrap()
}

/// DDR partition for the first A53
pub fn ddr_partition(payload: Vec<u8>) -> ImageGeneratorPartition {
    ImageGeneratorPartition {
        payload,
        load_addr: DDR_LOAD_ADDR,
        exec_addr: DDR_LOAD_ADDR,
        ..Default::default()
    }
}

pub fn partition_header(image: &[u8], index: usize) -> PartitionHeader {
    let offset = FIRST_PARTITION_HEADER + index * PARTITION_HEADER_BYTE_SIZE;
    PartitionHeader::read_from(&image[offset..offset + PARTITION_HEADER_BYTE_SIZE]).unwrap()
}

/// Byte offset of the data of partition `index`
pub fn data_offset(image: &[u8], index: usize) -> usize {
    partition_header(image, index).data_word_offset() as usize * 4
}

/// Emulated SoC plus the loader working memory
pub struct TestSoc {
    pub soc: EmuSoc,
    chunk_buf: Vec<u8>,
    hash_store: Vec<u8>,
}

impl TestSoc {
    pub fn new(image: Vec<u8>) -> Self {
        Self::with_args(SocArgs {
            image,
            device_key: Some(DEVICE_AES_KEY),
            ..Default::default()
        })
    }

    pub fn with_args(args: SocArgs) -> Self {
        Self {
            soc: EmuSoc::new(args),
            chunk_buf: vec![0u8; sboot_fsbl::config::DEFAULT_CHUNK_SIZE],
            hash_store: vec![0u8; HASH_STORE_SLOTS * 48],
        }
    }

    pub fn env(&mut self) -> LoaderEnv<'_> {
        LoaderEnv {
            hash: &mut self.soc.hash,
            rsa: &mut self.soc.rsa,
            cipher: &mut self.soc.cipher,
            device: &mut self.soc.device,
            sink: &mut self.soc.sink,
            platform: &mut self.soc.platform,
            chunk_buf: &mut self.chunk_buf,
            hash_store: &mut self.hash_store,
        }
    }

    pub fn boot(&mut self, config: LoaderConfig) -> SbootResult<LoadSummary> {
        PartitionLoader::new(self.env(), config).load_image()
    }

    pub fn memory(&self, addr: u64, len: usize) -> &[u8] {
        self.soc.sink.memory.read(addr, len).unwrap()
    }

    pub fn fabric_data(&self) -> &[u8] {
        self.soc.sink.fabric.received()
    }
}

/// Loader configuration pinning the test PPK
pub fn pinned_config() -> LoaderConfig {
    LoaderConfig {
        ppk_digest: Some(ppk_digest()),
        ..Default::default()
    }
}
