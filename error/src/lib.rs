/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains API and macros used by the boot loader for error handling

--*/
#![cfg_attr(not(feature = "std"), no_std)]
use core::convert::From;
use core::num::{NonZeroU32, TryFromIntError};

/// Boot loader error type
/// Derives debug, copy, clone, eq, and partial eq
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SbootError(pub NonZeroU32);

/// Macro to define error constants ensuring uniqueness
///
/// This macro takes a list of (name, value, doc) tuples and generates
/// constant definitions for each error code.
#[macro_export]
macro_rules! define_error_constants {
    ($(($name:ident, $value:expr, $doc:expr)),* $(,)?) => {
        $(
            #[doc = $doc]
            pub const $name: SbootError = SbootError::new_const($value);
        )*

        #[cfg(test)]
        /// Returns a vector of all defined error constants for testing uniqueness
        pub fn all_constants() -> Vec<(& 'static str, u32)> {
            vec![
                $(
                    (stringify!($name), $value),
                )*
            ]
        }
    };
}

impl SbootError {
    /// Create an error; intended to only be used from const contexts, as we don't want
    /// runtime panics if val is zero. The preferred way to get an SbootError from a u32 is to
    /// use `SbootError::try_from()` from the `TryFrom` trait impl.
    const fn new_const(val: u32) -> Self {
        match NonZeroU32::new(val) {
            Some(val) => Self(val),
            None => panic!("SbootError cannot be 0"),
        }
    }

    define_error_constants![
        (
            BOOT_HEADER_MARKER_MISMATCH,
            0x0001_0001,
            "Boot header marker mismatch"
        ),
        (
            BOOT_HEADER_SIZE_MISMATCH,
            0x0001_0002,
            "Boot header size mismatch"
        ),
        (
            BOOT_HEADER_CHECKSUM_INVALID,
            0x0001_0003,
            "Boot header checksum invalid"
        ),
        (
            BOOT_HEADER_PARTITION_COUNT_INVALID,
            0x0001_0004,
            "Boot header partition count is zero or above the supported maximum"
        ),
        (
            HEADER_CHECKSUM_INVALID,
            0x0001_0010,
            "Partition header checksum invalid"
        ),
        (
            HEADER_INVALID_DEST_CPU,
            0x0001_0011,
            "Partition header destination CPU invalid"
        ),
        (
            HEADER_INVALID_DEST_DEVICE,
            0x0001_0012,
            "Partition header destination device invalid"
        ),
        (
            HEADER_INVALID_DEST_COMBINATION,
            0x0001_0013,
            "Partition header destination CPU and device combination invalid"
        ),
        (
            HEADER_INVALID_EXEC_STATE,
            0x0001_0014,
            "Partition header execution state invalid for destination CPU"
        ),
        (
            HEADER_RESERVED_BITS_SET,
            0x0001_0015,
            "Partition header reserved bits set"
        ),
        (
            HEADER_INVALID_LENGTH,
            0x0001_0016,
            "Partition header word lengths inconsistent"
        ),
        (
            HEADER_INVALID_SECURITY_COMBINATION,
            0x0001_0017,
            "Partition header combines checksum with signature or encryption"
        ),
        (
            HEADER_INVALID_OFFSET,
            0x0001_0018,
            "Partition header offset arithmetic overflow"
        ),
        (
            HEADER_PARTITION_INDEX_OUT_OF_BOUNDS,
            0x0001_0019,
            "Partition index beyond partition count"
        ),
        (
            PPK_DIGEST_MISMATCH,
            0x0002_0001,
            "Chain of trust: PPK digest does not match provisioned value"
        ),
        (
            SPK_SIGNATURE_INVALID,
            0x0002_0002,
            "Chain of trust: SPK signature invalid"
        ),
        (
            PARTITION_SIGNATURE_INVALID,
            0x0002_0003,
            "Chain of trust: partition signature invalid"
        ),
        (
            CERT_RSA_DECRYPT_FAILURE,
            0x0002_0004,
            "Chain of trust: RSA operation failed"
        ),
        (
            CERT_DIGEST_FAILURE,
            0x0002_0005,
            "Chain of trust: digest calculation failed"
        ),
        (
            CERT_INVALID_LENGTH,
            0x0002_0006,
            "Chain of trust: certificate length invalid"
        ),
        (CHECKSUM_MISMATCH, 0x0003_0001, "Partition checksum mismatch"),
        (
            CHECKSUM_TYPE_UNSUPPORTED,
            0x0003_0002,
            "Partition checksum type recognised but unsupported"
        ),
        (
            CHECKSUM_COPY_FAILED,
            0x0003_0003,
            "Stored partition checksum could not be read"
        ),
        (
            CHECKSUM_DIGEST_FAILURE,
            0x0003_0004,
            "Partition checksum digest calculation failed"
        ),
        (
            BLOCK_AUTH_CHUNK_HASH_MISMATCH,
            0x0004_0001,
            "Block authentication: re-read chunk hash mismatch"
        ),
        (
            BLOCK_AUTH_HASH_STORE_EXHAUSTED,
            0x0004_0002,
            "Block authentication: chunk hash store too small for block"
        ),
        (
            BLOCK_AUTH_BLOCK_SIZE_ZERO,
            0x0004_0003,
            "Block authentication: secure bitstream without block size"
        ),
        (
            BLOCK_AUTH_INVALID_LAYOUT,
            0x0004_0004,
            "Block authentication: block and certificate layout inconsistent"
        ),
        (
            BLOCK_AUTH_CHUNK_SIZE_INVALID,
            0x0004_0005,
            "Block authentication: chunk size zero or not word aligned"
        ),
        (
            DECRYPT_TAG_MISMATCH,
            0x0005_0001,
            "Decryption: GCM tag mismatch"
        ),
        (
            DECRYPT_IMAGE_LEN_MISMATCH,
            0x0005_0002,
            "Decryption: decrypted length differs from expected length"
        ),
        (
            DECRYPT_KEY_LOAD_FAILURE,
            0x0005_0003,
            "Decryption: key load failed"
        ),
        (
            DECRYPT_ENGINE_FAILURE,
            0x0005_0004,
            "Decryption: cipher engine failure"
        ),
        (
            DEST_ADDRESS_OUT_OF_RANGE,
            0x0006_0001,
            "Destination: load address or length out of range"
        ),
        (
            DEST_MEMORY_POWER_UP_FAILED,
            0x0006_0002,
            "Destination: memory power up failed"
        ),
        (
            DEST_MEMORY_INIT_FAILED,
            0x0006_0003,
            "Destination: memory ECC initialization failed"
        ),
        (
            LOADER_DEVICE_COPY_FAILED,
            0x0007_0001,
            "Loader: boot device copy failed"
        ),
        (
            LOADER_PMU_SLEEP_TIMEOUT,
            0x0007_0002,
            "Loader: timeout waiting for PMU to sleep"
        ),
        (
            LOADER_PMU_READY_TIMEOUT,
            0x0007_0003,
            "Loader: timeout waiting for PMU firmware present"
        ),
        (
            LOADER_FABRIC_CHUNK_TIMEOUT,
            0x0007_0004,
            "Loader: timeout waiting for bitstream chunk transfer"
        ),
        (
            LOADER_FABRIC_DONE_TIMEOUT,
            0x0007_0005,
            "Loader: timeout waiting for PL configuration done"
        ),
        (
            LOADER_SINK_WRITE_FAILED,
            0x0007_0006,
            "Loader: destination write failed"
        ),
        (
            LOADER_FABRIC_WRITE_FAILED,
            0x0007_0007,
            "Loader: bitstream fabric write failed"
        ),
        (
            LOADER_PARTITION_TOO_LARGE,
            0x0007_0008,
            "Loader: partition length arithmetic overflow"
        ),
        (
            DRIVER_HASH_INVALID_STATE,
            0x0008_0001,
            "Driver: hash engine used before start"
        ),
        (
            DRIVER_CIPHER_INVALID_STATE,
            0x0008_0002,
            "Driver: cipher engine used without key or message"
        ),
        (
            DRIVER_CIPHER_LENGTH_MISMATCH,
            0x0008_0003,
            "Driver: cipher input and output lengths differ"
        ),
        (
            DRIVER_RSA_INVALID_KEY,
            0x0008_0004,
            "Driver: RSA modulus or exponent invalid"
        ),
        (
            DRIVER_DEVICE_READ_OUT_OF_BOUNDS,
            0x0008_0005,
            "Driver: boot device read out of bounds"
        ),
        (
            DRIVER_MEMORY_OUT_OF_BOUNDS,
            0x0008_0006,
            "Driver: memory access outside mapped regions"
        ),
        (
            DRIVER_FABRIC_NOT_READY,
            0x0008_0007,
            "Driver: fabric transfer issued while previous transfer busy"
        ),
        (
            DRIVER_MEMORY_DOMAIN_UNPOWERED,
            0x0008_0008,
            "Driver: memory domain accessed before power up"
        ),
    ];
}

impl From<core::num::NonZeroU32> for crate::SbootError {
    fn from(val: core::num::NonZeroU32) -> Self {
        crate::SbootError(val)
    }
}

impl From<SbootError> for core::num::NonZeroU32 {
    fn from(val: SbootError) -> Self {
        val.0
    }
}

impl From<SbootError> for u32 {
    fn from(val: SbootError) -> Self {
        core::num::NonZeroU32::from(val).get()
    }
}

impl TryFrom<u32> for SbootError {
    type Error = TryFromIntError;
    fn try_from(val: u32) -> Result<Self, TryFromIntError> {
        match NonZeroU32::try_from(val) {
            Ok(val) => Ok(SbootError(val)),
            Err(err) => Err(err),
        }
    }
}

pub type SbootResult<T> = Result<T, SbootError>;
