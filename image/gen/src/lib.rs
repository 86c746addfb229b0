/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains data structures for the boot image generator.

--*/

mod encrypt;
mod generator;

pub use encrypt::key_roll_encrypt;
pub use generator::ImageGenerator;

use sboot_image_types::*;

/// RSA private key in the byte order used by the image
#[derive(Clone)]
pub struct ImageRsaPrivKey {
    /// Modulus, big-endian
    pub modulus: RsaBlock,

    pub public_exponent: u32,

    /// Private exponent, big-endian
    pub private_exponent: RsaBlock,
}

/// Image Generator Crypto Trait
pub trait ImageGeneratorCrypto {
    /// Calculate digest
    fn digest(&self, alg: HashAlgorithm, data: &[u8]) -> anyhow::Result<Digest>;

    /// Sign `digest` with PKCS#1 v1.5 padding
    fn rsa_sign(
        &self,
        alg: HashAlgorithm,
        digest: &Digest,
        priv_key: &ImageRsaPrivKey,
    ) -> anyhow::Result<RsaBlock>;

    /// Public key, including the Montgomery pre-computation
    fn rsa_pub_key(&self, priv_key: &ImageRsaPrivKey) -> anyhow::Result<RsaPublicKey>;

    /// AES-256-GCM encryption without additional data
    fn aes_gcm_encrypt(
        &self,
        key: &AesKeyBytes,
        iv: &AesIvBytes,
        plaintext: &[u8],
    ) -> anyhow::Result<(Vec<u8>, GcmTag)>;
}

/// Signing keys
#[derive(Clone)]
pub struct ImageGeneratorKeys {
    pub ppk: ImageRsaPrivKey,

    pub spk: ImageRsaPrivKey,

    pub spk_id: u32,
}

/// Partition configuration
#[derive(Clone)]
pub struct ImageGeneratorPartition {
    pub payload: Vec<u8>,

    pub dest_cpu: DestinationCpu,

    pub dest_device: DestinationDevice,

    pub owner: PartitionOwner,

    pub aarch32: bool,

    pub load_addr: u64,

    pub exec_addr: u64,

    /// Store a SHA3-384 checksum
    pub checksum: bool,

    /// Sign with the SPK
    pub authenticate: bool,

    /// Encrypt with key rolling
    pub encrypt: bool,

    /// Plaintext bytes per key rolled block, zero for a single block
    pub key_roll_block_len: usize,

    /// Authentication block size code of PL partitions
    pub block_size_code: u8,

    pub iv_fragment: u8,

    /// Header only, the partition executes from `exec_addr`
    pub execute_in_place: bool,
}

impl Default for ImageGeneratorPartition {
    fn default() -> Self {
        Self {
            payload: Vec::new(),
            dest_cpu: DestinationCpu::A53_0,
            dest_device: DestinationDevice::Ps,
            owner: PartitionOwner::Fsbl,
            aarch32: false,
            load_addr: 0,
            exec_addr: 0,
            checksum: false,
            authenticate: false,
            encrypt: false,
            key_roll_block_len: 0,
            block_size_code: 0,
            iv_fragment: 0,
            execute_in_place: false,
        }
    }
}

/// Image Generator Configuration
#[derive(Clone, Default)]
pub struct ImageGeneratorConfig {
    pub hash_alg: HashAlgorithm,

    pub boot_iv: AesIvBytes,

    /// Device key, required by encrypted partitions
    pub device_key: Option<AesKeyBytes>,

    /// Signing keys, required by authenticated partitions
    pub keys: Option<ImageGeneratorKeys>,

    pub partitions: Vec<ImageGeneratorPartition>,
}
