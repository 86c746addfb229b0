/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains data structures for the boot image: boot header,
    partition headers, authentication certificates and secure headers.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

use core::ops::Range;

use bitfield::bitfield;
use getset::{CopyGetters, Getters, MutGetters, Setters};
use memoffset::{offset_of, span_of};
use zerocopy::{AsBytes, FromBytes};
use zeroize::Zeroize;

pub const BOOT_HEADER_MARKER: u32 = 0x4642_5348;
pub const BOOT_HEADER_BYTE_SIZE: usize = core::mem::size_of::<BootHeader>();
pub const MAX_PARTITIONS: u32 = 32;
pub const WORD_BYTE_SIZE: u32 = 4;
pub const PARTITION_HEADER_BYTE_SIZE: usize = core::mem::size_of::<PartitionHeader>();
pub const BOOT_IV_BYTE_SIZE: usize = 12;
pub const RSA_KEY_BYTE_SIZE: usize = 512;
pub const RSA_KEY_PAD_BYTE_SIZE: usize = 60;
pub const AUTH_CERT_UDF_BYTE_SIZE: usize = 56;
pub const AUTH_CERT_BYTE_SIZE: usize = core::mem::size_of::<AuthCertificate>();
pub const AES_KEY_BYTE_SIZE: usize = 32;
pub const AES_IV_BYTE_SIZE: usize = 12;
pub const GCM_TAG_BYTE_SIZE: usize = 16;
pub const SECURE_HEADER_BYTE_SIZE: usize = core::mem::size_of::<SecureHeader>();
pub const SECURE_HEADER_WITH_TAG_BYTE_SIZE: usize = SECURE_HEADER_BYTE_SIZE + GCM_TAG_BYTE_SIZE;
pub const SHA3_384_DIGEST_BYTE_SIZE: usize = 48;
pub const SHA2_256_DIGEST_BYTE_SIZE: usize = 32;
pub const MAX_DIGEST_BYTE_SIZE: usize = SHA3_384_DIGEST_BYTE_SIZE;
pub const DIGEST_INFO_BYTE_SIZE: usize = 19;

/// Image attribute bits selecting SHA2 for bitstream block authentication
pub const IMAGE_ATTRIBUTE_SHA2_MASK: u32 = 0x3000;

pub type RsaBlock = [u8; RSA_KEY_BYTE_SIZE];
pub type AesKeyBytes = [u8; AES_KEY_BYTE_SIZE];
pub type AesIvBytes = [u8; AES_IV_BYTE_SIZE];
pub type GcmTag = [u8; GCM_TAG_BYTE_SIZE];

const SHA3_384_DIGEST_INFO: [u8; DIGEST_INFO_BYTE_SIZE] = [
    0x30, 0x41, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x09, 0x05,
    0x00, 0x04, 0x30,
];

const SHA2_256_DIGEST_INFO: [u8; DIGEST_INFO_BYTE_SIZE] = [
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01, 0x05,
    0x00, 0x04, 0x20,
];

/// Hash algorithm used for authentication
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha3_384,
    Sha2_256,
}

impl HashAlgorithm {
    /// Digest length in bytes
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Sha3_384 => SHA3_384_DIGEST_BYTE_SIZE,
            Self::Sha2_256 => SHA2_256_DIGEST_BYTE_SIZE,
        }
    }

    /// DER encoded `DigestInfo` prefix placed in front of the digest
    pub const fn digest_info(self) -> &'static [u8; DIGEST_INFO_BYTE_SIZE] {
        match self {
            Self::Sha3_384 => &SHA3_384_DIGEST_INFO,
            Self::Sha2_256 => &SHA2_256_DIGEST_INFO,
        }
    }
}

/// Digest of up to `MAX_DIGEST_BYTE_SIZE` bytes
#[derive(Debug, Copy, Clone, Eq, PartialEq, Zeroize)]
pub struct Digest {
    bytes: [u8; MAX_DIGEST_BYTE_SIZE],
    len: usize,
}

impl Digest {
    /// Create a zeroed digest sized for `alg`
    pub const fn new(alg: HashAlgorithm) -> Self {
        Self {
            bytes: [0u8; MAX_DIGEST_BYTE_SIZE],
            len: alg.digest_len(),
        }
    }

    /// Create a digest from `bytes`, `None` if longer than the maximum digest size
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let mut digest = Self {
            bytes: [0u8; MAX_DIGEST_BYTE_SIZE],
            len: bytes.len(),
        };
        digest.bytes.get_mut(..bytes.len())?.copy_from_slice(bytes);
        Some(digest)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Digest {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

/// Calculate the header checksum: the one's complement of the wrapping sum
/// of the little-endian words in `bytes`.
pub fn header_checksum(bytes: &[u8]) -> u32 {
    let sum = bytes
        .chunks_exact(WORD_BYTE_SIZE as usize)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .fold(0u32, |acc, w| acc.wrapping_add(w));
    !sum
}

/// Build the 512-byte PKCS#1-v1.5 encoded block for `digest`
///
/// `00 01 FF .. FF 00 || DigestInfo(alg) || digest`
///
/// Returns `None` if `digest` length does not match the algorithm.
pub fn pkcs1_v15_encode(alg: HashAlgorithm, digest: &[u8]) -> Option<RsaBlock> {
    if digest.len() != alg.digest_len() {
        return None;
    }
    let mut block = [0xFFu8; RSA_KEY_BYTE_SIZE];
    let digest_start = RSA_KEY_BYTE_SIZE - digest.len();
    let info_start = digest_start - DIGEST_INFO_BYTE_SIZE;
    block[0] = 0x00;
    block[1] = 0x01;
    block[info_start - 1] = 0x00;
    block[info_start..digest_start].copy_from_slice(alg.digest_info());
    block[digest_start..].copy_from_slice(digest);
    Some(block)
}

/// Derive the IV of the first secure header of a partition
pub fn partition_iv(boot_iv: &AesIvBytes, fragment: u8) -> AesIvBytes {
    let mut iv = *boot_iv;
    let last = u32::from_be_bytes([iv[8], iv[9], iv[10], iv[11]]).wrapping_add(fragment as u32);
    iv[8..].copy_from_slice(&last.to_be_bytes());
    iv
}

/// Boot Image Header
#[repr(C)]
#[derive(AsBytes, FromBytes, Default, Debug, Clone, Copy, Getters, Setters, CopyGetters)]
pub struct BootHeader {
    /// Marker
    #[getset(get_copy = "pub", set = "pub")]
    marker: u32,

    /// Size of `BootHeader` structure
    #[getset(get_copy = "pub", set = "pub")]
    size: u32,

    /// Image Attributes
    #[getset(get_copy = "pub", set = "pub")]
    image_attributes: u32,

    /// Boot IV
    #[getset(get = "pub", set = "pub")]
    iv: AesIvBytes,

    /// Number of partitions
    #[getset(get_copy = "pub", set = "pub")]
    partition_count: u32,

    /// Word offset of the first partition header
    #[getset(get_copy = "pub", set = "pub")]
    partition_header_word_offset: u32,

    /// Checksum
    #[getset(get_copy = "pub", set = "pub")]
    checksum: u32,
}

impl BootHeader {
    /// Returns `Range<u32>` of the bytes covered by the checksum
    pub fn checksummed_range() -> Range<u32> {
        let span = span_of!(BootHeader, marker..checksum);
        span.start as u32..span.end as u32
    }

    /// Calculate the checksum over all words preceding the checksum
    pub fn calc_checksum(&self) -> u32 {
        let range = Self::checksummed_range();
        header_checksum(&self.as_bytes()[range.start as usize..range.end as usize])
    }

    /// Hash algorithm used by every authenticated partition of the image
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        if self.image_attributes & IMAGE_ATTRIBUTE_SHA2_MASK == IMAGE_ATTRIBUTE_SHA2_MASK {
            HashAlgorithm::Sha2_256
        } else {
            HashAlgorithm::Sha3_384
        }
    }
}

bitfield! {
    /// Partition attribute word
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct PartitionAttributes(u32);
    impl Debug;
    pub trust_zone_secure, set_trust_zone_secure: 0;
    pub u8, target_el, set_target_el: 2, 1;
    pub aarch32, set_aarch32: 3;
    pub u8, dest_device, set_dest_device: 6, 4;
    pub encrypted, set_encrypted: 7;
    pub u8, dest_cpu, set_dest_cpu: 11, 8;
    pub u8, checksum_type, set_checksum_type: 14, 12;
    pub rsa_signature, set_rsa_signature: 15;
    pub u8, owner, set_owner: 17, 16;
    pub big_endian, set_big_endian: 18;
    pub u8, block_size_code, set_block_size_code: 22, 20;
    pub vector_location, set_vector_location: 23;
    pub u8, reserved, set_reserved: 31, 24;
}

impl PartitionAttributes {
    /// Authentication block size in bytes, zero when the partition is not split in blocks
    pub fn block_size(&self) -> u32 {
        match self.block_size_code() {
            0 => 0,
            code => (4 * 1024) << (code - 1),
        }
    }
}

/// Partition Header
#[repr(C)]
#[derive(AsBytes, FromBytes, Default, Debug, Clone, Copy, Getters, Setters, CopyGetters)]
pub struct PartitionHeader {
    /// Encrypted partition data length in words
    #[getset(get_copy = "pub", set = "pub")]
    encrypted_data_word_len: u32,

    /// Unencrypted partition data length in words
    #[getset(get_copy = "pub", set = "pub")]
    unencrypted_data_word_len: u32,

    /// Total partition length in words, certificates included
    #[getset(get_copy = "pub", set = "pub")]
    total_data_word_len: u32,

    /// Word offset of the next partition header
    #[getset(get_copy = "pub", set = "pub")]
    next_partition_header_word_offset: u32,

    exec_addr_lo: u32,

    exec_addr_hi: u32,

    load_addr_lo: u32,

    load_addr_hi: u32,

    /// Word offset of the partition data in the image
    #[getset(get_copy = "pub", set = "pub")]
    data_word_offset: u32,

    attributes: u32,

    /// Section count
    #[getset(get_copy = "pub", set = "pub")]
    section_count: u32,

    /// Word offset of the stored partition checksum
    #[getset(get_copy = "pub", set = "pub")]
    checksum_word_offset: u32,

    /// Word offset of the image header
    #[getset(get_copy = "pub", set = "pub")]
    image_header_word_offset: u32,

    /// Word offset of the (first) authentication certificate
    #[getset(get_copy = "pub", set = "pub")]
    auth_cert_word_offset: u32,

    /// IV fragment (bits 7:0), remaining bits reserved
    #[getset(get_copy = "pub", set = "pub")]
    iv_word: u32,

    /// Checksum
    #[getset(get_copy = "pub", set = "pub")]
    checksum: u32,
}

impl PartitionHeader {
    pub const IV_FRAGMENT_MASK: u32 = 0xFF;

    /// Returns `Range<u32>` of the bytes covered by the checksum
    pub fn checksummed_range() -> Range<u32> {
        let span = span_of!(PartitionHeader, encrypted_data_word_len..checksum);
        span.start as u32..span.end as u32
    }

    /// Calculate the checksum over all words preceding the checksum
    pub fn calc_checksum(&self) -> u32 {
        let range = Self::checksummed_range();
        header_checksum(&self.as_bytes()[range.start as usize..range.end as usize])
    }

    pub fn attributes(&self) -> PartitionAttributes {
        PartitionAttributes(self.attributes)
    }

    pub fn set_attributes(&mut self, attributes: PartitionAttributes) -> &mut Self {
        self.attributes = attributes.0;
        self
    }

    pub fn exec_addr(&self) -> u64 {
        (self.exec_addr_hi as u64) << 32 | self.exec_addr_lo as u64
    }

    pub fn set_exec_addr(&mut self, addr: u64) -> &mut Self {
        self.exec_addr_lo = addr as u32;
        self.exec_addr_hi = (addr >> 32) as u32;
        self
    }

    pub fn load_addr(&self) -> u64 {
        (self.load_addr_hi as u64) << 32 | self.load_addr_lo as u64
    }

    pub fn set_load_addr(&mut self, addr: u64) -> &mut Self {
        self.load_addr_lo = addr as u32;
        self.load_addr_hi = (addr >> 32) as u32;
        self
    }

    pub fn iv_fragment(&self) -> u8 {
        (self.iv_word & Self::IV_FRAGMENT_MASK) as u8
    }

    pub fn iv_reserved_bits(&self) -> u32 {
        self.iv_word & !Self::IV_FRAGMENT_MASK
    }
}

/// RSA public key as stored in the authentication certificate
#[repr(C)]
#[derive(AsBytes, FromBytes, Debug, Clone, Copy, Eq, PartialEq, Getters, Setters, CopyGetters)]
pub struct RsaPublicKey {
    /// Modulus, big-endian
    #[getset(get = "pub", set = "pub")]
    modulus: RsaBlock,

    /// Montgomery pre-computation (R^2 mod N), big-endian
    #[getset(get = "pub", set = "pub")]
    modulus_ext: RsaBlock,

    /// Public exponent
    #[getset(get_copy = "pub", set = "pub")]
    exponent: u32,

    _pad: [u8; RSA_KEY_PAD_BYTE_SIZE],
}

impl Default for RsaPublicKey {
    fn default() -> Self {
        Self::new_zeroed()
    }
}

/// Authentication Certificate
#[repr(C)]
#[derive(AsBytes, FromBytes, Debug, Clone, Copy, Getters, Setters, MutGetters, CopyGetters)]
pub struct AuthCertificate {
    /// Authentication header
    #[getset(get_copy = "pub", set = "pub")]
    auth_header: u32,

    /// SPK identifier
    #[getset(get_copy = "pub", set = "pub")]
    spk_id: u32,

    /// User defined field
    #[getset(get = "pub", set = "pub")]
    udf: [u8; AUTH_CERT_UDF_BYTE_SIZE],

    /// Primary public key
    #[getset(get = "pub", get_mut = "pub", set = "pub")]
    ppk: RsaPublicKey,

    /// Secondary public key
    #[getset(get = "pub", get_mut = "pub", set = "pub")]
    spk: RsaPublicKey,

    /// SPK signature, produced with the PPK
    #[getset(get = "pub", set = "pub")]
    spk_signature: RsaBlock,

    /// Boot header signature
    #[getset(get = "pub", set = "pub")]
    boot_header_signature: RsaBlock,

    /// Partition signature, produced with the SPK
    #[getset(get = "pub", set = "pub")]
    partition_signature: RsaBlock,
}

impl Default for AuthCertificate {
    fn default() -> Self {
        Self::new_zeroed()
    }
}

impl AuthCertificate {
    /// Returns `Range<u32>` of the key selector hashed ahead of the keys
    pub fn selector_range() -> Range<u32> {
        let span = span_of!(AuthCertificate, auth_header..=spk_id);
        span.start as u32..span.end as u32
    }

    /// Returns `Range<u32>` containing the PPK
    pub fn ppk_range() -> Range<u32> {
        let span = span_of!(AuthCertificate, ppk);
        span.start as u32..span.end as u32
    }

    /// Returns `Range<u32>` containing the SPK
    pub fn spk_range() -> Range<u32> {
        let span = span_of!(AuthCertificate, spk);
        span.start as u32..span.end as u32
    }

    /// Returns `Range<u32>` of the certificate bytes covered by the partition signature
    pub fn signed_range() -> Range<u32> {
        0..offset_of!(AuthCertificate, partition_signature) as u32
    }

    /// Bounds checked view of `range` inside the certificate
    pub fn bytes(&self, range: Range<u32>) -> Option<&[u8]> {
        self.as_bytes().get(range.start as usize..range.end as usize)
    }
}

/// Decrypted secure header
#[repr(C)]
#[derive(AsBytes, FromBytes, Default, Debug, Clone, Copy, Zeroize, Getters, Setters)]
pub struct SecureHeader {
    /// Key for the next block
    #[getset(get = "pub", set = "pub")]
    key: AesKeyBytes,

    /// IV for the next block
    #[getset(get = "pub", set = "pub")]
    iv: AesIvBytes,

    next_block_word_len: [u8; 4],
}

impl SecureHeader {
    /// Length in bytes of the next block; `None` on overflow
    pub fn next_block_len(&self) -> Option<u32> {
        u32::from_be_bytes(self.next_block_word_len).checked_mul(WORD_BYTE_SIZE)
    }

    pub fn set_next_block_word_len(&mut self, words: u32) -> &mut Self {
        self.next_block_word_len = words.to_be_bytes();
        self
    }
}

/// Destination CPU
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DestinationCpu {
    None = 0,
    A53_0 = 1,
    A53_1 = 2,
    A53_2 = 3,
    A53_3 = 4,
    R5_0 = 5,
    R5_1 = 6,
    R5Lockstep = 7,
    Pmu = 8,
}

impl DestinationCpu {
    pub fn is_a53(self) -> bool {
        matches!(self, Self::A53_0 | Self::A53_1 | Self::A53_2 | Self::A53_3)
    }
}

impl TryFrom<u8> for DestinationCpu {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::A53_0),
            2 => Ok(Self::A53_1),
            3 => Ok(Self::A53_2),
            4 => Ok(Self::A53_3),
            5 => Ok(Self::R5_0),
            6 => Ok(Self::R5_1),
            7 => Ok(Self::R5Lockstep),
            8 => Ok(Self::Pmu),
            _ => Err(()),
        }
    }
}

impl From<DestinationCpu> for u8 {
    fn from(value: DestinationCpu) -> Self {
        value as u8
    }
}

/// Destination device
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DestinationDevice {
    None = 0,
    Ps = 1,
    Pl = 2,
}

impl TryFrom<u8> for DestinationDevice {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Ps),
            2 => Ok(Self::Pl),
            _ => Err(()),
        }
    }
}

impl From<DestinationDevice> for u8 {
    fn from(value: DestinationDevice) -> Self {
        value as u8
    }
}

/// Partition checksum type
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChecksumType {
    None = 0,
    Md5 = 1,
    Sha2 = 2,
    Sha3 = 3,
}

impl TryFrom<u8> for ChecksumType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Md5),
            2 => Ok(Self::Sha2),
            3 => Ok(Self::Sha3),
            _ => Err(()),
        }
    }
}

impl From<ChecksumType> for u8 {
    fn from(value: ChecksumType) -> Self {
        value as u8
    }
}

/// Partition owner
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PartitionOwner {
    Fsbl = 0,
    UBoot = 1,
}

impl From<PartitionOwner> for u8 {
    fn from(value: PartitionOwner) -> Self {
        value as u8
    }
}
