/*++

Licensed under the Apache-2.0 license.

File Name:

    checksum.rs

Abstract:

    SHA3-384 integrity check of partitions without signature.

--*/

use sboot_drivers::{cprint_digest, cprintln, DeviceCopy, HashEngine};
use sboot_error::{SbootError, SbootResult};
use sboot_image_types::{Digest, HashAlgorithm, SHA3_384_DIGEST_BYTE_SIZE};

pub struct ChecksumVerifier<'a> {
    hash: &'a mut dyn HashEngine,
    device: &'a mut dyn DeviceCopy,
}

impl<'a> ChecksumVerifier<'a> {
    pub fn new(hash: &'a mut dyn HashEngine, device: &'a mut dyn DeviceCopy) -> Self {
        Self { hash, device }
    }

    /// Read the stored checksum at `offset` of the boot device
    pub fn stored_checksum(&mut self, offset: u64) -> SbootResult<Digest> {
        let mut digest = Digest::new(HashAlgorithm::Sha3_384);
        self.device
            .copy(offset, digest.as_bytes_mut())
            .map_err(|_| SbootError::CHECKSUM_COPY_FAILED)?;
        Ok(digest)
    }

    /// Verify the checksum of a partition already copied to memory
    pub fn verify(&mut self, payload: &[u8], expected: &Digest) -> SbootResult<()> {
        let actual = self
            .hash
            .digest(HashAlgorithm::Sha3_384, payload)
            .map_err(|_| SbootError::CHECKSUM_DIGEST_FAILURE)?;
        compare(&actual, expected)
    }

    /// Verify the checksum of `len` bytes at `src_offset` of the boot device
    ///
    /// The partition is read in `scratch` sized chunks; nothing is forwarded.
    pub fn verify_from_device(
        &mut self,
        src_offset: u64,
        len: u64,
        scratch: &mut [u8],
        expected: &Digest,
    ) -> SbootResult<()> {
        if scratch.is_empty() {
            Err(SbootError::CHECKSUM_DIGEST_FAILURE)?;
        }
        self.hash
            .start(HashAlgorithm::Sha3_384)
            .map_err(|_| SbootError::CHECKSUM_DIGEST_FAILURE)?;

        let mut offset = 0u64;
        while offset < len {
            let n = core::cmp::min(len - offset, scratch.len() as u64) as usize;
            let chunk = &mut scratch[..n];
            self.device
                .copy(src_offset + offset, chunk)
                .map_err(|_| SbootError::LOADER_DEVICE_COPY_FAILED)?;
            self.hash
                .update(chunk)
                .map_err(|_| SbootError::CHECKSUM_DIGEST_FAILURE)?;
            offset += n as u64;
        }

        let actual = self
            .hash
            .finish()
            .map_err(|_| SbootError::CHECKSUM_DIGEST_FAILURE)?;
        compare(&actual, expected)
    }
}

fn compare(actual: &Digest, expected: &Digest) -> SbootResult<()> {
    if actual.len() != SHA3_384_DIGEST_BYTE_SIZE || actual.as_bytes() != expected.as_bytes() {
        cprintln!("[cksum] Partition checksum mismatch");
        cprint_digest!("[cksum]", "stored", expected.as_bytes());
        cprint_digest!("[cksum]", "computed", actual.as_bytes());
        Err(SbootError::CHECKSUM_MISMATCH)?;
    }
    Ok(())
}
