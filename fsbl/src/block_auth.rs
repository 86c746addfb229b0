/*++

Licensed under the Apache-2.0 license.

File Name:

    block_auth.rs

Abstract:

    Two pass authentication of partitions too large to stage in memory.

--*/

use sboot_drivers::{cprint_digest, cprintln, DeviceCopy, HashEngine, SignatureEngine};
use sboot_error::{SbootError, SbootResult};
use sboot_image_types::{AuthCertificate, Digest, HashAlgorithm, AUTH_CERT_BYTE_SIZE, WORD_BYTE_SIZE};
use sboot_image_verify::{absorb_signed_cert, ChainOfTrustVerifier};
use zerocopy::{AsBytes, FromBytes};

/// Placement of a block authenticated partition on the boot device
///
/// Data blocks are contiguous from `data_offset`, followed by one
/// certificate per block starting at `cert_offset`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlockLayout {
    pub data_offset: u64,
    pub cert_offset: u64,

    /// Data plus certificates
    pub total_len: u64,

    pub block_size: u64,
}

impl BlockLayout {
    /// Number of blocks, after checking the certificates account for the
    /// rest of the partition
    pub fn block_count(&self) -> SbootResult<u64> {
        if self.block_size == 0 {
            Err(SbootError::BLOCK_AUTH_BLOCK_SIZE_ZERO)?;
        }
        let data_len = self
            .cert_offset
            .checked_sub(self.data_offset)
            .filter(|len| *len > 0)
            .ok_or(SbootError::BLOCK_AUTH_INVALID_LAYOUT)?;
        let blocks = data_len.div_ceil(self.block_size);
        let expected_total = blocks
            .checked_mul(AUTH_CERT_BYTE_SIZE as u64)
            .and_then(|certs| certs.checked_add(data_len));
        if expected_total != Some(self.total_len) {
            cprintln!(
                "[auth] Block layout mismatch: data {} blocks {} total {}",
                data_len,
                blocks,
                self.total_len
            );
            Err(SbootError::BLOCK_AUTH_INVALID_LAYOUT)?;
        }
        Ok(blocks)
    }
}

/// Per partition working memory
pub struct BlockAuthState<'s> {
    /// Chunk sized staging buffer
    chunk_buf: &'s mut [u8],

    /// Running digests committed by the first pass, one per chunk
    hash_store: &'s mut [u8],
}

impl<'s> BlockAuthState<'s> {
    pub fn new(chunk_buf: &'s mut [u8], hash_store: &'s mut [u8]) -> SbootResult<Self> {
        if chunk_buf.is_empty() || chunk_buf.len() % WORD_BYTE_SIZE as usize != 0 {
            Err(SbootError::BLOCK_AUTH_CHUNK_SIZE_INVALID)?;
        }
        Ok(Self {
            chunk_buf,
            hash_store,
        })
    }

    /// Chunk digests the store can hold for `alg`
    pub fn capacity(&self, alg: HashAlgorithm) -> usize {
        self.hash_store.len() / alg.digest_len()
    }

    fn committed(&mut self, alg: HashAlgorithm, index: usize) -> SbootResult<&mut [u8]> {
        let len = alg.digest_len();
        self.hash_store
            .get_mut(index * len..(index + 1) * len)
            .ok_or(SbootError::BLOCK_AUTH_HASH_STORE_EXHAUSTED)
    }
}

/// Streaming Block Authenticator
///
/// Every block is authenticated by its own certificate. The first pass
/// reads the block from the boot device, commits a running digest per chunk
/// and verifies the block signature. The second pass reads the block again
/// and forwards a chunk only once its running digest matches the
/// committed one.
pub struct StreamingBlockAuthenticator<'a> {
    device: &'a mut dyn DeviceCopy,
    hash: &'a mut dyn HashEngine,
    rsa: &'a mut dyn SignatureEngine,
    alg: HashAlgorithm,
    ppk_digest: Option<&'a Digest>,
    state: BlockAuthState<'a>,
}

impl<'a> StreamingBlockAuthenticator<'a> {
    pub fn new(
        device: &'a mut dyn DeviceCopy,
        hash: &'a mut dyn HashEngine,
        rsa: &'a mut dyn SignatureEngine,
        alg: HashAlgorithm,
        ppk_digest: Option<&'a Digest>,
        state: BlockAuthState<'a>,
    ) -> Self {
        Self {
            device,
            hash,
            rsa,
            alg,
            ppk_digest,
            state,
        }
    }

    /// Authenticate every block of `layout` and pass verified chunks to
    /// `forward`
    ///
    /// # Returns
    ///
    /// * `u64` - Number of blocks
    pub fn authenticate<F>(&mut self, layout: &BlockLayout, mut forward: F) -> SbootResult<u64>
    where
        F: FnMut(&[u8]) -> SbootResult<()>,
    {
        let blocks = layout.block_count()?;
        let mut cert = AuthCertificate::new_zeroed();

        let mut src = layout.data_offset;
        let mut cert_offset = layout.cert_offset;
        for index in 0..blocks {
            let len = core::cmp::min(layout.block_size, layout.cert_offset - src);
            self.device
                .copy(cert_offset, cert.as_bytes_mut())
                .map_err(|_| SbootError::LOADER_DEVICE_COPY_FAILED)?;

            cprintln!("[auth] Block {} at 0x{:X}, {} bytes", index, src, len);
            self.authenticate_block(&cert, src, len, &mut forward)?;

            src += len;
            cert_offset += AUTH_CERT_BYTE_SIZE as u64;
        }
        Ok(blocks)
    }

    fn authenticate_block<F>(
        &mut self,
        cert: &AuthCertificate,
        src: u64,
        len: u64,
        forward: &mut F,
    ) -> SbootResult<()>
    where
        F: FnMut(&[u8]) -> SbootResult<()>,
    {
        let spk = ChainOfTrustVerifier::new(
            &mut *self.hash,
            &mut *self.rsa,
            self.alg,
            self.ppk_digest,
        )
        .verify_spk(cert)?;

        let chunk_size = self.state.chunk_buf.len() as u64;
        let chunks = core::cmp::max(len.div_ceil(chunk_size), 1) as usize;
        if chunks > self.state.capacity(self.alg) {
            cprintln!("[auth] {} chunks exceed hash store", chunks);
            Err(SbootError::BLOCK_AUTH_HASH_STORE_EXHAUSTED)?;
        }

        let digest = self.commit(cert, src, len)?;
        ChainOfTrustVerifier::new(&mut *self.hash, &mut *self.rsa, self.alg, self.ppk_digest)
            .verify_partition(&spk, &digest)?;

        self.forward_verified(src, len, forward)
    }

    /// First pass: commit per chunk digests and digest the signed bytes
    fn commit(&mut self, cert: &AuthCertificate, src: u64, len: u64) -> SbootResult<Digest> {
        self.hash
            .start(self.alg)
            .map_err(|_| SbootError::CERT_DIGEST_FAILURE)?;

        let chunk_size = self.state.chunk_buf.len() as u64;
        let mut offset = 0u64;
        let mut index = 0usize;
        while offset < len {
            let n = core::cmp::min(chunk_size, len - offset) as usize;
            let chunk = &mut self.state.chunk_buf[..n];
            self.device
                .copy(src + offset, chunk)
                .map_err(|_| SbootError::LOADER_DEVICE_COPY_FAILED)?;
            self.hash
                .update(chunk)
                .map_err(|_| SbootError::CERT_DIGEST_FAILURE)?;

            let running = self
                .hash
                .running_digest()
                .map_err(|_| SbootError::CERT_DIGEST_FAILURE)?;
            self.state
                .committed(self.alg, index)?
                .copy_from_slice(running.as_bytes());

            offset += n as u64;
            index += 1;
        }

        absorb_signed_cert(&mut *self.hash, cert).map_err(|_| SbootError::CERT_DIGEST_FAILURE)?;
        self.hash
            .finish()
            .map_err(|_| SbootError::CERT_DIGEST_FAILURE)
    }

    /// Second pass: re-read every chunk from the boot device
    fn forward_verified<F>(&mut self, src: u64, len: u64, forward: &mut F) -> SbootResult<()>
    where
        F: FnMut(&[u8]) -> SbootResult<()>,
    {
        self.hash
            .start(self.alg)
            .map_err(|_| SbootError::CERT_DIGEST_FAILURE)?;

        let chunk_size = self.state.chunk_buf.len() as u64;
        let mut offset = 0u64;
        let mut index = 0usize;
        while offset < len {
            let n = core::cmp::min(chunk_size, len - offset) as usize;
            self.device
                .copy(src + offset, &mut self.state.chunk_buf[..n])
                .map_err(|_| SbootError::LOADER_DEVICE_COPY_FAILED)?;
            self.hash
                .update(&self.state.chunk_buf[..n])
                .map_err(|_| SbootError::CERT_DIGEST_FAILURE)?;

            let running = self
                .hash
                .running_digest()
                .map_err(|_| SbootError::CERT_DIGEST_FAILURE)?;
            let committed = self.state.committed(self.alg, index)?;
            let diff = committed
                .iter()
                .zip(running.as_bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b));
            if diff != 0 {
                cprintln!("[auth] Chunk {} changed since signature check", index);
                cprint_digest!("[auth]", "committed", committed);
                cprint_digest!("[auth]", "re-read", running.as_bytes());
                Err(SbootError::BLOCK_AUTH_CHUNK_HASH_MISMATCH)?;
            }

            forward(&self.state.chunk_buf[..n])?;

            offset += n as u64;
            index += 1;
        }
        Ok(())
    }
}
