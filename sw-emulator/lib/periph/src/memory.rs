/*++

Licensed under the Apache-2.0 license.

File Name:

    memory.rs

Abstract:

    File contains the emulated memory map and the destination sink.

--*/

use crate::{
    Fabric, DDR_BASE, OCM_BASE, OCM_SIZE, PMU_RAM_BASE, PMU_RAM_SIZE, R5_0_TCM_BASE,
    R5_0_TCM_WINDOW, R5_1_TCM_BASE, R5_1_TCM_WINDOW,
};
use sboot_drivers::{DestinationSink, MemoryDomains};
use sboot_error::{SbootError, SbootResult};
use std::cell::Cell;
use std::rc::Rc;

/// Power state shared by the platform and the memory map
pub type PowerState = Rc<Cell<MemoryDomains>>;

pub struct MemoryRegion {
    pub base: u64,
    pub data: Vec<u8>,

    /// Domain that must be powered before access
    pub domain: Option<MemoryDomains>,
}

impl MemoryRegion {
    pub fn new(base: u64, size: usize, domain: Option<MemoryDomains>) -> Self {
        Self {
            base,
            data: vec![0u8; size],
            domain,
        }
    }

    fn contains(&self, addr: u64, len: usize) -> bool {
        let end = match addr.checked_add(len as u64) {
            Some(end) => end,
            None => return false,
        };
        addr >= self.base && end <= self.base + self.data.len() as u64
    }
}

pub struct MemoryMap {
    regions: Vec<MemoryRegion>,
    power: PowerState,
}

impl MemoryMap {
    /// DDR at zero, OCM, PMU RAM and both R5 TCM windows
    pub fn new(ddr_size: usize, power: PowerState) -> Self {
        Self {
            regions: vec![
                MemoryRegion::new(DDR_BASE, ddr_size, None),
                MemoryRegion::new(OCM_BASE, OCM_SIZE, None),
                MemoryRegion::new(PMU_RAM_BASE, PMU_RAM_SIZE, None),
                MemoryRegion::new(
                    R5_0_TCM_BASE,
                    R5_0_TCM_WINDOW,
                    Some(MemoryDomains::R5_0_TCM),
                ),
                MemoryRegion::new(
                    R5_1_TCM_BASE,
                    R5_1_TCM_WINDOW,
                    Some(MemoryDomains::R5_1_TCM),
                ),
            ],
            power,
        }
    }

    pub fn region_mut(&mut self, addr: u64, len: usize) -> SbootResult<&mut [u8]> {
        let powered = self.power.get();
        let region = self
            .regions
            .iter_mut()
            .find(|r| r.contains(addr, len))
            .ok_or(SbootError::DRIVER_MEMORY_OUT_OF_BOUNDS)?;
        if let Some(domain) = region.domain {
            if !powered.contains(domain) {
                Err(SbootError::DRIVER_MEMORY_DOMAIN_UNPOWERED)?;
            }
        }
        let start = (addr - region.base) as usize;
        region
            .data
            .get_mut(start..start + len)
            .ok_or(SbootError::DRIVER_MEMORY_OUT_OF_BOUNDS)
    }

    /// Read memory regardless of power state
    pub fn read(&self, addr: u64, len: usize) -> Option<&[u8]> {
        let region = self.regions.iter().find(|r| r.contains(addr, len))?;
        let start = (addr - region.base) as usize;
        region.data.get(start..start + len)
    }
}

/// Destination sink: memory map plus the PL configuration port
pub struct EmuSink {
    pub memory: MemoryMap,
    pub fabric: Fabric,
}

impl DestinationSink for EmuSink {
    fn region(&mut self, addr: u64, len: usize) -> SbootResult<&mut [u8]> {
        self.memory.region_mut(addr, len)
    }

    fn push_to_bitstream_fabric(&mut self, data: &[u8]) -> SbootResult<()> {
        self.fabric.push(data)
    }

    fn fabric_transfer_done(&mut self) -> bool {
        self.fabric.transfer_done()
    }

    fn fabric_config_done(&mut self) -> bool {
        self.fabric.config_done()
    }

    fn reset_fabric(&mut self) {
        self.fabric.reset()
    }
}
