/*++

Licensed under the Apache-2.0 license.

File Name:

    dest.rs

Abstract:

    Maps partition load addresses to global addresses and prepares the
    memory behind them.

--*/

use sboot_drivers::{cprintln, MemoryDomains, Platform};
use sboot_error::{SbootError, SbootResult};
use sboot_image_types::{DestinationCpu, DestinationDevice};

pub const TCM_BANK_LEN: u64 = 0x1_0000;
pub const BTCM_START: u64 = 0x2_0000;

/// Lockstep mode combines the TCMs of both cores
pub const LOCKSTEP_TCM_LEN: u64 = 4 * TCM_BANK_LEN;

pub const R5_0_ATCM_GLOBAL: u64 = 0xFFE0_0000;
pub const R5_0_BTCM_GLOBAL: u64 = R5_0_ATCM_GLOBAL + BTCM_START;
pub const R5_1_ATCM_GLOBAL: u64 = 0xFFE9_0000;
pub const R5_1_BTCM_GLOBAL: u64 = R5_1_ATCM_GLOBAL + BTCM_START;

const R5_0_TCM_WINDOW_END: u64 = R5_0_ATCM_GLOBAL + LOCKSTEP_TCM_LEN;
const R5_1_TCM_WINDOW_END: u64 = R5_1_BTCM_GLOBAL + TCM_BANK_LEN;

/// Destination resolver
///
/// Holds which memory domains were already powered and initialized so
/// that every domain is prepared at most once per boot.
#[derive(Debug, Default)]
pub struct DestinationResolver {
    powered: MemoryDomains,
    ecc_initialized: MemoryDomains,
}

impl DestinationResolver {
    /// Resolve the global address of a partition
    ///
    /// # Arguments
    ///
    /// * `platform` - Power and ECC control
    /// * `running_cpu` - CPU executing the loader
    /// * `cpu` - Destination CPU of the partition
    /// * `device` - Destination device of the partition
    /// * `addr` - Load address from the partition header
    /// * `len` - Bytes to be placed at `addr`
    ///
    /// # Returns
    ///
    /// * `u64` - Address usable by the loader
    pub fn resolve(
        &mut self,
        platform: &mut dyn Platform,
        running_cpu: DestinationCpu,
        cpu: DestinationCpu,
        device: DestinationDevice,
        addr: u64,
        len: u64,
    ) -> SbootResult<u64> {
        if device == DestinationDevice::Pl {
            return Ok(addr);
        }

        let global = remap(cpu, addr, len)?;
        if let Some(domains) = tcm_domains(cpu, global) {
            self.prepare(platform, running_cpu, domains)?;
        }
        Ok(global)
    }

    /// Domains powered by this resolver
    pub fn powered(&self) -> MemoryDomains {
        self.powered
    }

    pub fn ecc_initialized(&self) -> MemoryDomains {
        self.ecc_initialized
    }

    fn prepare(
        &mut self,
        platform: &mut dyn Platform,
        running_cpu: DestinationCpu,
        domains: MemoryDomains,
    ) -> SbootResult<()> {
        // The TCM of the running CPU is live and holds the loader itself
        let owned = running_domains(running_cpu);

        let power_up = domains - owned - self.powered;
        if !power_up.is_empty() {
            cprintln!("[dest] Power up TCM 0x{:X}", power_up.bits());
            platform
                .power_up_memory(power_up)
                .map_err(|_| SbootError::DEST_MEMORY_POWER_UP_FAILED)?;
            self.powered |= power_up;
        }

        let init = domains - owned - self.ecc_initialized;
        if !init.is_empty() {
            cprintln!("[dest] ECC init TCM 0x{:X}", init.bits());
            platform
                .init_memory_ecc(init)
                .map_err(|_| SbootError::DEST_MEMORY_INIT_FAILED)?;
            self.ecc_initialized |= init;
        }
        Ok(())
    }
}

fn remap(cpu: DestinationCpu, addr: u64, len: u64) -> SbootResult<u64> {
    let in_atcm = addr < TCM_BANK_LEN;
    let in_btcm = (BTCM_START..BTCM_START + TCM_BANK_LEN).contains(&addr);

    let (bank_end, base) = match cpu {
        DestinationCpu::R5_0 | DestinationCpu::R5_1 if in_atcm || in_btcm => {
            let bank_end = if in_atcm {
                TCM_BANK_LEN
            } else {
                BTCM_START + TCM_BANK_LEN
            };
            let base = if cpu == DestinationCpu::R5_0 {
                R5_0_ATCM_GLOBAL
            } else {
                R5_1_ATCM_GLOBAL
            };
            (bank_end, base)
        }
        DestinationCpu::R5Lockstep if addr < LOCKSTEP_TCM_LEN => {
            (LOCKSTEP_TCM_LEN, R5_0_ATCM_GLOBAL)
        }
        _ => return Ok(addr),
    };

    match addr.checked_add(len) {
        Some(end) if end <= bank_end => Ok(base + addr),
        _ => {
            cprintln!("[dest] TCM range exceeds bank: addr 0x{:X} len {}", addr, len);
            Err(SbootError::DEST_ADDRESS_OUT_OF_RANGE)
        }
    }
}

fn tcm_domains(cpu: DestinationCpu, global: u64) -> Option<MemoryDomains> {
    if (R5_0_ATCM_GLOBAL..R5_0_TCM_WINDOW_END).contains(&global) {
        if cpu == DestinationCpu::R5Lockstep {
            Some(MemoryDomains::R5_LOCKSTEP_TCM)
        } else {
            Some(MemoryDomains::R5_0_TCM)
        }
    } else if (R5_1_ATCM_GLOBAL..R5_1_TCM_WINDOW_END).contains(&global) {
        Some(MemoryDomains::R5_1_TCM)
    } else {
        None
    }
}

fn running_domains(running_cpu: DestinationCpu) -> MemoryDomains {
    match running_cpu {
        DestinationCpu::R5_0 => MemoryDomains::R5_0_TCM,
        DestinationCpu::R5_1 => MemoryDomains::R5_1_TCM,
        DestinationCpu::R5Lockstep => MemoryDomains::R5_LOCKSTEP_TCM,
        _ => MemoryDomains::empty(),
    }
}
