/*++

Licensed under the Apache-2.0 license.

File Name:

    partition_load.rs

Abstract:

    Loads, verifies and places the partitions of a boot image.

--*/

use crate::block_auth::{BlockAuthState, BlockLayout, StreamingBlockAuthenticator};
use crate::config::{LoaderConfig, ResetReason};
use crate::dest::DestinationResolver;
use crate::fsbl_env::LoaderEnv;
use crate::hand_off::{HandoffEntry, HandoffTable};
use crate::key_roll::KeyRollingDecryptor;
use sboot_drivers::{cprintln, wait, DestinationSink, DeviceCopy};
use sboot_error::{SbootError, SbootResult};
use sboot_image_types::{
    partition_iv, AuthCertificate, DestinationCpu, PartitionHeader, AUTH_CERT_BYTE_SIZE,
    BOOT_HEADER_BYTE_SIZE, PARTITION_HEADER_BYTE_SIZE, WORD_BYTE_SIZE,
};
use sboot_image_verify::{
    validate, validate_boot_header, BootHeaderInfo, ChainOfTrustVerifier, ChecksumVerifier,
    HeaderCheck, PartitionInfo, PartitionSecurity, SkipReason,
};
use zerocopy::{AsBytes, FromBytes};
use zeroize::Zeroize;

/// Result of loading one partition
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PartitionOutcome {
    /// Placed in memory at `address`
    Loaded { address: u64, len: u64 },

    /// Streamed to the programmable logic
    Configured { len: u64 },

    /// Executes from its load address, nothing copied
    ExecuteInPlace,

    Skipped(SkipReason),
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoadSummary {
    pub handoff: HandoffTable,
    pub loaded: u32,
    pub skipped: u32,
}

/// Partition Loader
pub struct PartitionLoader<'a> {
    env: LoaderEnv<'a>,
    config: LoaderConfig,
    resolver: DestinationResolver,
    handoff: HandoffTable,
}

impl<'a> PartitionLoader<'a> {
    pub fn new(env: LoaderEnv<'a>, config: LoaderConfig) -> Self {
        Self {
            env,
            config,
            resolver: DestinationResolver::default(),
            handoff: HandoffTable::default(),
        }
    }

    pub fn handoff(&self) -> &HandoffTable {
        &self.handoff
    }

    /// Read and validate the boot header at the image offset
    pub fn read_boot_header(&mut self) -> SbootResult<BootHeaderInfo> {
        let mut raw = [0u8; BOOT_HEADER_BYTE_SIZE];
        self.env
            .device
            .copy(self.config.image_offset, &mut raw)
            .map_err(|_| SbootError::LOADER_DEVICE_COPY_FAILED)?;
        validate_boot_header(&raw)
    }

    /// Load every partition of the boot image
    ///
    /// The first error aborts the boot; skipped partitions do not.
    pub fn load_image(&mut self) -> SbootResult<LoadSummary> {
        let boot = self.read_boot_header()?;
        cprintln!("[ldr] Boot image: {} partitions", boot.partition_count());

        let mut summary = LoadSummary::default();
        for index in 0..boot.partition_count() {
            match self.load_partition(&boot, index) {
                Ok(PartitionOutcome::Skipped(_)) => summary.skipped += 1,
                Ok(_) => summary.loaded += 1,
                Err(err) => {
                    cprintln!("[ldr] Partition {} failed: 0x{:08X}", index, u32::from(err));
                    return Err(err);
                }
            }
        }

        summary.handoff = self.handoff;
        cprintln!("[ldr] {} handoff entries", summary.handoff.len());
        Ok(summary)
    }

    /// Load partition `index`
    ///
    /// # Arguments
    ///
    /// * `boot` - Validated boot header
    /// * `index` - Partition index
    pub fn load_partition(
        &mut self,
        boot: &BootHeaderInfo,
        index: u32,
    ) -> SbootResult<PartitionOutcome> {
        self.env.platform.restart_watchdog();

        let raw = self.read_partition_header(boot, index)?;
        let info = match validate(&raw)? {
            HeaderCheck::Load(info) => info,
            HeaderCheck::Skip(reason) => {
                cprintln!("[ldr] Partition {} skipped", index);
                return Ok(PartitionOutcome::Skipped(reason));
            }
        };

        if info.is_bitstream() && self.config.reset_reason == ResetReason::PsOnly {
            cprintln!("[ldr] Partition {}: PL kept across PS-only reset", index);
            return Ok(PartitionOutcome::Skipped(SkipReason::PsOnlyReset));
        }

        let cpu = match info.dest_cpu {
            DestinationCpu::None if !info.is_bitstream() => self.config.running_cpu,
            cpu => cpu,
        };

        if info.is_xip() {
            cprintln!("[ldr] Partition {}: execute in place", index);
            self.record_handoff(&info, cpu);
            return Ok(PartitionOutcome::ExecuteInPlace);
        }

        if info.is_bitstream() {
            let len = self.load_bitstream(boot, &info)?;
            return Ok(PartitionOutcome::Configured { len });
        }

        if info.is_pmu() {
            self.pmu_sleep(&info)?;
        }

        let (address, len) = self.load_to_memory(boot, &info, cpu)?;

        if info.is_pmu() {
            if !self.next_is_pmu(boot, index) {
                self.pmu_release()?;
            }
        } else {
            self.record_handoff(&info, cpu);
        }

        cprintln!("[ldr] Partition {}: {} bytes at 0x{:X}", index, len, address);
        Ok(PartitionOutcome::Loaded { address, len })
    }

    fn read_partition_header(
        &mut self,
        boot: &BootHeaderInfo,
        index: u32,
    ) -> SbootResult<[u8; PARTITION_HEADER_BYTE_SIZE]> {
        let offset = self
            .config
            .image_offset
            .checked_add(boot.partition_header_offset(index)?)
            .ok_or(SbootError::HEADER_INVALID_OFFSET)?;
        let mut raw = [0u8; PARTITION_HEADER_BYTE_SIZE];
        self.env
            .device
            .copy(offset, &mut raw)
            .map_err(|_| SbootError::LOADER_DEVICE_COPY_FAILED)?;
        Ok(raw)
    }

    /// Whether partition `index + 1` also targets the PMU
    fn next_is_pmu(&mut self, boot: &BootHeaderInfo, index: u32) -> bool {
        let next = index + 1;
        if next >= boot.partition_count() {
            return false;
        }
        // Only a hint; the header is validated when it is loaded
        self.read_partition_header(boot, next)
            .ok()
            .and_then(|raw| PartitionHeader::read_from(&raw[..]))
            .and_then(|header| DestinationCpu::try_from(header.attributes().dest_cpu()).ok())
            == Some(DestinationCpu::Pmu)
    }

    fn record_handoff(&mut self, info: &PartitionInfo, cpu: DestinationCpu) {
        let entry = HandoffEntry {
            cpu,
            exec_state: info.exec_state,
            entry_address: info.header.exec_addr(),
        };
        self.handoff.record(entry);
    }

    /// Wait for the PMU to sleep before its memory is written
    ///
    /// Only partitions with an entry point request the sleep.
    fn pmu_sleep(&mut self, info: &PartitionInfo) -> SbootResult<()> {
        let platform = &mut *self.env.platform;
        if info.header.exec_addr() != 0 {
            cprintln!("[ldr] PMU sleep request");
            platform.pmu_trigger_ipi();
        }
        wait::until(
            self.config.pmu_polls,
            SbootError::LOADER_PMU_SLEEP_TIMEOUT,
            || platform.pmu_sleeping(),
        )
    }

    fn pmu_release(&mut self) -> SbootResult<()> {
        cprintln!("[ldr] PMU wake");
        let platform = &mut *self.env.platform;
        platform.pmu_wake();
        wait::until(
            self.config.pmu_polls,
            SbootError::LOADER_PMU_READY_TIMEOUT,
            || platform.pmu_fw_present(),
        )
    }

    fn chunk_len(&self) -> SbootResult<usize> {
        let len = self.config.chunk_size;
        if len == 0 || len % WORD_BYTE_SIZE as usize != 0 || len > self.env.chunk_buf.len() {
            Err(SbootError::BLOCK_AUTH_CHUNK_SIZE_INVALID)?;
        }
        Ok(len)
    }

    /// Copy a partition to its destination, then verify and decrypt it there
    ///
    /// # Returns
    ///
    /// * `(u64, u64)` - Destination address and plaintext length
    fn load_to_memory(
        &mut self,
        boot: &BootHeaderInfo,
        info: &PartitionInfo,
        cpu: DestinationCpu,
    ) -> SbootResult<(u64, u64)> {
        let src = info.data_offset(self.config.image_offset)?;
        let copy_len = if info.security.is_authenticated() {
            info.total_len() - AUTH_CERT_BYTE_SIZE as u64
        } else {
            info.total_len()
        };
        let len = usize::try_from(copy_len).map_err(|_| SbootError::LOADER_PARTITION_TOO_LARGE)?;

        let address = self.resolver.resolve(
            &mut *self.env.platform,
            self.config.running_cpu,
            cpu,
            info.dest_device,
            info.header.load_addr(),
            copy_len,
        )?;

        cprintln!("[ldr] Copy 0x{:X} -> 0x{:X}, {} bytes", src, address, copy_len);
        let result = self.place(boot, info, src, address, len);
        if result.is_err() {
            if let Ok(region) = self.env.sink.region(address, len) {
                region.zeroize();
            }
        }
        result.map(|plain_len| (address, plain_len))
    }

    fn place(
        &mut self,
        boot: &BootHeaderInfo,
        info: &PartitionInfo,
        src: u64,
        address: u64,
        len: usize,
    ) -> SbootResult<u64> {
        let region = self
            .env
            .sink
            .region(address, len)
            .map_err(|_| SbootError::DEST_ADDRESS_OUT_OF_RANGE)?;
        self.env
            .device
            .copy(src, region)
            .map_err(|_| SbootError::LOADER_DEVICE_COPY_FAILED)?;

        match info.security {
            PartitionSecurity::Plain | PartitionSecurity::Encrypted => {}
            PartitionSecurity::ChecksummedOnly => {
                let offset = info.checksum_offset(self.config.image_offset)?;
                let mut verifier = ChecksumVerifier::new(&mut *self.env.hash, &mut *self.env.device);
                let stored = verifier.stored_checksum(offset)?;
                let payload = self
                    .env
                    .sink
                    .region(address, len)
                    .map_err(|_| SbootError::DEST_ADDRESS_OUT_OF_RANGE)?;
                verifier.verify(payload, &stored)?;
            }
            PartitionSecurity::Authenticated | PartitionSecurity::AuthenticatedEncrypted => {
                let mut cert = AuthCertificate::default();
                self.env
                    .device
                    .copy(src + len as u64, cert.as_bytes_mut())
                    .map_err(|_| SbootError::LOADER_DEVICE_COPY_FAILED)?;
                let payload = self
                    .env
                    .sink
                    .region(address, len)
                    .map_err(|_| SbootError::DEST_ADDRESS_OUT_OF_RANGE)?;

                let mut verifier = ChainOfTrustVerifier::new(
                    &mut *self.env.hash,
                    &mut *self.env.rsa,
                    boot.hash_alg,
                    self.config.ppk_digest.as_ref(),
                );
                let spk = verifier.verify_spk(&cert)?;
                let digest = verifier.partition_digest(payload, &cert)?;
                verifier.verify_partition(&spk, &digest)?;
                cprintln!("[auth] Partition authenticated");
            }
        }

        if !info.security.is_encrypted() {
            return Ok(len as u64);
        }
        let ct_len = info.encrypted_len();
        if ct_len > len as u64 {
            Err(SbootError::HEADER_INVALID_LENGTH)?;
        }
        self.decrypt_in_place(boot, info, address, ct_len)
    }

    /// Decrypt `ct_len` bytes at `address` into plaintext at the same address
    ///
    /// Plaintext never overtakes the ciphertext still to be read since
    /// secure headers and tags are consumed without output.
    fn decrypt_in_place(
        &mut self,
        boot: &BootHeaderInfo,
        info: &PartitionInfo,
        address: u64,
        ct_len: u64,
    ) -> SbootResult<u64> {
        let chunk_len = self.chunk_len()?;
        let iv = partition_iv(boot.header.iv(), info.header.iv_fragment());
        let LoaderEnv {
            cipher,
            sink,
            chunk_buf,
            ..
        } = &mut self.env;

        let mut decryptor = KeyRollingDecryptor::new(&mut **cipher, &iv, info.unencrypted_len())?;
        let mut read = 0u64;
        let mut write = address;
        while read < ct_len {
            let n = core::cmp::min(chunk_len as u64, ct_len - read) as usize;
            let chunk = &mut chunk_buf[..n];
            chunk.copy_from_slice(
                sink.region(address + read, n)
                    .map_err(|_| SbootError::DEST_ADDRESS_OUT_OF_RANGE)?,
            );
            decryptor.update(chunk, &mut |pt: &[u8]| {
                sink.write(write, pt)
                    .map_err(|_| SbootError::LOADER_SINK_WRITE_FAILED)?;
                write += pt.len() as u64;
                Ok(())
            })?;
            read += n as u64;
        }
        let plain_len = decryptor.finish()?;
        chunk_buf[..chunk_len].zeroize();

        // Secure headers leave ciphertext behind the plaintext
        sink.region(address + plain_len, (ct_len - plain_len) as usize)
            .map_err(|_| SbootError::DEST_ADDRESS_OUT_OF_RANGE)?
            .zeroize();

        cprintln!("[dec] {} bytes decrypted", plain_len);
        Ok(plain_len)
    }

    /// Stream a bitstream partition to the PL and wait for configuration
    fn load_bitstream(&mut self, boot: &BootHeaderInfo, info: &PartitionInfo) -> SbootResult<u64> {
        let result = self.stream_bitstream(boot, info).and_then(|len| {
            let sink = &mut *self.env.sink;
            wait::until(
                self.config.fabric_done_polls,
                SbootError::LOADER_FABRIC_DONE_TIMEOUT,
                || sink.fabric_config_done(),
            )?;
            Ok(len)
        });

        match result {
            Ok(len) => {
                cprintln!("[ldr] PL configured, {} bytes", len);
                Ok(len)
            }
            Err(err) => {
                cprintln!("[ldr] PL reset after failure");
                self.env.sink.reset_fabric();
                Err(err)
            }
        }
    }

    fn stream_bitstream(&mut self, boot: &BootHeaderInfo, info: &PartitionInfo) -> SbootResult<u64> {
        let image_offset = self.config.image_offset;
        let src = info.data_offset(image_offset)?;
        let total = info.total_len();
        let chunk_len = self.chunk_len()?;
        let polls = self.config.fabric_chunk_polls;
        let iv = partition_iv(boot.header.iv(), info.header.iv_fragment());
        let ppk_digest = self.config.ppk_digest.as_ref();

        let LoaderEnv {
            hash,
            rsa,
            cipher,
            device,
            sink,
            chunk_buf,
            hash_store,
            ..
        } = &mut self.env;
        let chunk_buf = &mut chunk_buf[..chunk_len];

        let mut pushed = 0u64;
        let mut push = |data: &[u8]| -> SbootResult<()> {
            push_to_fabric(&mut **sink, data, polls)?;
            pushed += data.len() as u64;
            Ok(())
        };

        match info.security {
            PartitionSecurity::Authenticated | PartitionSecurity::AuthenticatedEncrypted => {
                let layout = BlockLayout {
                    data_offset: src,
                    cert_offset: info.cert_offset(image_offset)?,
                    total_len: total,
                    block_size: info.block_size as u64,
                };
                let state = BlockAuthState::new(chunk_buf, hash_store)?;
                let mut auth = StreamingBlockAuthenticator::new(
                    &mut **device,
                    &mut **hash,
                    &mut **rsa,
                    boot.hash_alg,
                    ppk_digest,
                    state,
                );
                if info.security.is_encrypted() {
                    let mut decryptor =
                        KeyRollingDecryptor::new(&mut **cipher, &iv, info.unencrypted_len())?;
                    auth.authenticate(&layout, |chunk| decryptor.update(chunk, &mut push))?;
                    decryptor.finish()?;
                } else {
                    auth.authenticate(&layout, &mut push)?;
                }
            }
            PartitionSecurity::ChecksummedOnly => {
                let mut verifier = ChecksumVerifier::new(&mut **hash, &mut **device);
                let stored = verifier.stored_checksum(info.checksum_offset(image_offset)?)?;
                verifier.verify_from_device(src, total, chunk_buf, &stored)?;
                stream_from_device(&mut **device, src, total, chunk_buf, &mut push)?;
            }
            PartitionSecurity::Encrypted => {
                let mut decryptor =
                    KeyRollingDecryptor::new(&mut **cipher, &iv, info.unencrypted_len())?;
                stream_from_device(&mut **device, src, total, chunk_buf, &mut |chunk: &[u8]| {
                    decryptor.update(chunk, &mut push)
                })?;
                decryptor.finish()?;
            }
            PartitionSecurity::Plain => {
                stream_from_device(&mut **device, src, total, chunk_buf, &mut push)?;
            }
        }
        Ok(pushed)
    }
}

/// Push `data` to the PL and wait for the transfer to drain
fn push_to_fabric(sink: &mut dyn DestinationSink, data: &[u8], polls: u32) -> SbootResult<()> {
    sink.push_to_bitstream_fabric(data)
        .map_err(|_| SbootError::LOADER_FABRIC_WRITE_FAILED)?;
    wait::until(polls, SbootError::LOADER_FABRIC_CHUNK_TIMEOUT, || {
        sink.fabric_transfer_done()
    })
}

fn stream_from_device<F>(
    device: &mut dyn DeviceCopy,
    src: u64,
    len: u64,
    buf: &mut [u8],
    forward: &mut F,
) -> SbootResult<()>
where
    F: FnMut(&[u8]) -> SbootResult<()>,
{
    let mut offset = 0u64;
    while offset < len {
        let n = core::cmp::min(buf.len() as u64, len - offset) as usize;
        let chunk = &mut buf[..n];
        device
            .copy(src + offset, chunk)
            .map_err(|_| SbootError::LOADER_DEVICE_COPY_FAILED)?;
        forward(chunk)?;
        offset += n as u64;
    }
    Ok(())
}
