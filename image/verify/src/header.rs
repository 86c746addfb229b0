/*++

Licensed under the Apache-2.0 license.

File Name:

    header.rs

Abstract:

    Boot header and partition header validation.

--*/

use sboot_drivers::cprintln;
use sboot_error::{SbootError, SbootResult};
use sboot_image_types::*;
use zerocopy::FromBytes;

/// Validated boot header
#[derive(Debug, Clone, Copy)]
pub struct BootHeaderInfo {
    pub header: BootHeader,

    /// Hash algorithm used by every authenticated partition of the image
    pub hash_alg: HashAlgorithm,
}

impl BootHeaderInfo {
    pub fn partition_count(&self) -> u32 {
        self.header.partition_count()
    }

    /// Byte offset of partition header `index` relative to the image start
    pub fn partition_header_offset(&self, index: u32) -> SbootResult<u64> {
        if index >= self.header.partition_count() {
            Err(SbootError::HEADER_PARTITION_INDEX_OUT_OF_BOUNDS)?;
        }
        let first = self.header.partition_header_word_offset() as u64 * WORD_BYTE_SIZE as u64;
        Ok(first + index as u64 * PARTITION_HEADER_BYTE_SIZE as u64)
    }
}

/// Validate the boot header at the start of the image
pub fn validate_boot_header(raw: &[u8; BOOT_HEADER_BYTE_SIZE]) -> SbootResult<BootHeaderInfo> {
    let header =
        BootHeader::read_from(&raw[..]).ok_or(SbootError::BOOT_HEADER_SIZE_MISMATCH)?;

    if header.marker() != BOOT_HEADER_MARKER {
        Err(SbootError::BOOT_HEADER_MARKER_MISMATCH)?;
    }

    if header.size() as usize != BOOT_HEADER_BYTE_SIZE {
        Err(SbootError::BOOT_HEADER_SIZE_MISMATCH)?;
    }

    if header.calc_checksum() != header.checksum() {
        Err(SbootError::BOOT_HEADER_CHECKSUM_INVALID)?;
    }

    if header.partition_count() == 0 || header.partition_count() > MAX_PARTITIONS {
        Err(SbootError::BOOT_HEADER_PARTITION_COUNT_INVALID)?;
    }

    Ok(BootHeaderInfo {
        hash_alg: header.hash_algorithm(),
        header,
    })
}

/// Why a partition is not loaded by this stage
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SkipReason {
    /// Partition belongs to a later stage
    NotOwner,

    /// Checksum type encoding is not known
    UnknownChecksumType,

    /// Bitstream partition during a PS-only reset
    PsOnlyReset,
}

/// Security treatment of a partition, decided once per header
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PartitionSecurity {
    Plain,
    Encrypted,
    ChecksummedOnly,
    Authenticated,
    AuthenticatedEncrypted,
}

impl PartitionSecurity {
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated | Self::AuthenticatedEncrypted)
    }

    pub fn is_encrypted(self) -> bool {
        matches!(self, Self::Encrypted | Self::AuthenticatedEncrypted)
    }
}

/// Execution state of the destination CPU
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ExecState {
    #[default]
    Aarch64,
    Aarch32,
}

/// Validated partition header
#[derive(Debug, Clone, Copy)]
pub struct PartitionInfo {
    pub header: PartitionHeader,
    pub dest_cpu: DestinationCpu,
    pub dest_device: DestinationDevice,
    pub exec_state: ExecState,
    pub security: PartitionSecurity,

    /// Authentication block size in bytes, zero if not split in blocks
    pub block_size: u32,
}

impl PartitionInfo {
    /// Execute in place partition: nothing to copy
    pub fn is_xip(&self) -> bool {
        self.header.total_data_word_len() == 0
    }

    pub fn is_bitstream(&self) -> bool {
        self.dest_device == DestinationDevice::Pl
    }

    pub fn is_pmu(&self) -> bool {
        self.dest_cpu == DestinationCpu::Pmu
    }

    pub fn total_len(&self) -> u64 {
        words_to_bytes(self.header.total_data_word_len())
    }

    pub fn encrypted_len(&self) -> u64 {
        words_to_bytes(self.header.encrypted_data_word_len())
    }

    pub fn unencrypted_len(&self) -> u64 {
        words_to_bytes(self.header.unencrypted_data_word_len())
    }

    /// Image offset of the partition data
    pub fn data_offset(&self, image_offset: u64) -> SbootResult<u64> {
        image_offset
            .checked_add(words_to_bytes(self.header.data_word_offset()))
            .ok_or(SbootError::HEADER_INVALID_OFFSET)
    }

    /// Image offset of the first authentication certificate
    pub fn cert_offset(&self, image_offset: u64) -> SbootResult<u64> {
        image_offset
            .checked_add(words_to_bytes(self.header.auth_cert_word_offset()))
            .ok_or(SbootError::HEADER_INVALID_OFFSET)
    }

    /// Image offset of the stored partition checksum
    pub fn checksum_offset(&self, image_offset: u64) -> SbootResult<u64> {
        image_offset
            .checked_add(words_to_bytes(self.header.checksum_word_offset()))
            .ok_or(SbootError::HEADER_INVALID_OFFSET)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum HeaderCheck {
    Load(PartitionInfo),
    Skip(SkipReason),
}

fn words_to_bytes(words: u32) -> u64 {
    words as u64 * WORD_BYTE_SIZE as u64
}

/// Validate a partition header
///
/// # Arguments
///
/// * `raw` - Partition header as read from the boot device
///
/// # Returns
///
/// * `HeaderCheck` - Partition to load, or the reason it is skipped
pub fn validate(raw: &[u8; PARTITION_HEADER_BYTE_SIZE]) -> SbootResult<HeaderCheck> {
    let header = PartitionHeader::read_from(&raw[..]).ok_or(SbootError::HEADER_INVALID_LENGTH)?;

    // Nothing else is trusted before the checksum matches
    if header.calc_checksum() != header.checksum() {
        cprintln!("[hdr] Partition header checksum invalid");
        Err(SbootError::HEADER_CHECKSUM_INVALID)?;
    }

    let attr = header.attributes();
    if attr.owner() != u8::from(PartitionOwner::Fsbl) {
        return Ok(HeaderCheck::Skip(SkipReason::NotOwner));
    }

    let checksum_type = match ChecksumType::try_from(attr.checksum_type()) {
        Ok(checksum_type) => checksum_type,
        Err(_) => return Ok(HeaderCheck::Skip(SkipReason::UnknownChecksumType)),
    };

    let dest_cpu =
        DestinationCpu::try_from(attr.dest_cpu()).map_err(|_| SbootError::HEADER_INVALID_DEST_CPU)?;
    let dest_device = DestinationDevice::try_from(attr.dest_device())
        .map_err(|_| SbootError::HEADER_INVALID_DEST_DEVICE)?;

    // PL partitions have no CPU; the PMU is only reachable through the PS
    let combination_valid = match (dest_device, dest_cpu) {
        (DestinationDevice::Pl, cpu) => cpu == DestinationCpu::None,
        (DestinationDevice::None | DestinationDevice::Ps, _) => true,
    };
    if !combination_valid {
        Err(SbootError::HEADER_INVALID_DEST_COMBINATION)?;
    }

    let exec_state = if attr.aarch32() {
        if !dest_cpu.is_a53() {
            Err(SbootError::HEADER_INVALID_EXEC_STATE)?;
        }
        ExecState::Aarch32
    } else {
        ExecState::Aarch64
    };

    if attr.reserved() != 0 || header.iv_reserved_bits() != 0 {
        Err(SbootError::HEADER_RESERVED_BITS_SET)?;
    }

    let security = security_of(attr, checksum_type)?;
    let info = PartitionInfo {
        header,
        dest_cpu,
        dest_device,
        exec_state,
        security,
        block_size: attr.block_size(),
    };
    validate_lengths(&info)?;

    Ok(HeaderCheck::Load(info))
}

fn security_of(
    attr: PartitionAttributes,
    checksum_type: ChecksumType,
) -> SbootResult<PartitionSecurity> {
    let rsa = attr.rsa_signature();
    let encrypted = attr.encrypted();

    if checksum_type != ChecksumType::None && (rsa || encrypted) {
        Err(SbootError::HEADER_INVALID_SECURITY_COMBINATION)?;
    }

    Ok(match (checksum_type, rsa, encrypted) {
        (ChecksumType::Md5 | ChecksumType::Sha2, _, _) => {
            Err(SbootError::CHECKSUM_TYPE_UNSUPPORTED)?
        }
        (ChecksumType::Sha3, _, _) => PartitionSecurity::ChecksummedOnly,
        (_, true, true) => PartitionSecurity::AuthenticatedEncrypted,
        (_, true, false) => PartitionSecurity::Authenticated,
        (_, false, true) => PartitionSecurity::Encrypted,
        (_, false, false) => PartitionSecurity::Plain,
    })
}

fn validate_lengths(info: &PartitionInfo) -> SbootResult<()> {
    let header = &info.header;
    let enc = header.encrypted_data_word_len();
    let unenc = header.unencrypted_data_word_len();
    let total = header.total_data_word_len();

    if enc == 0 && unenc == 0 && total == 0 {
        // Execute in place: only plain CPU partitions
        let cpu_destination = info.dest_device != DestinationDevice::Pl && !info.is_pmu();
        if cpu_destination && info.security == PartitionSecurity::Plain {
            return Ok(());
        }
        Err(SbootError::HEADER_INVALID_LENGTH)?;
    }

    if enc == 0 || unenc == 0 || total == 0 || enc > total {
        Err(SbootError::HEADER_INVALID_LENGTH)?;
    }

    if !info.security.is_encrypted() && unenc != enc {
        Err(SbootError::HEADER_INVALID_LENGTH)?;
    }

    if info.security.is_authenticated()
        && !info.is_bitstream()
        && info.total_len() <= AUTH_CERT_BYTE_SIZE as u64
    {
        Err(SbootError::HEADER_INVALID_LENGTH)?;
    }

    Ok(())
}
