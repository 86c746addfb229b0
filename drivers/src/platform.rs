/*++

Licensed under the Apache-2.0 license.

File Name:

    platform.rs

Abstract:

    File contains the API for power, watchdog and PMU services.

--*/

use bitflags::bitflags;
use sboot_error::SbootResult;

bitflags! {
    /// Tightly coupled memory domains
    #[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
    pub struct MemoryDomains: u32 {
        const R5_0_TCM = 0b01;
        const R5_1_TCM = 0b10;
        const R5_LOCKSTEP_TCM = Self::R5_0_TCM.bits() | Self::R5_1_TCM.bits();
    }
}

pub trait Platform {
    /// Power up `domains`
    fn power_up_memory(&mut self, domains: MemoryDomains) -> SbootResult<()>;

    /// Initialize the ECC of `domains`
    fn init_memory_ecc(&mut self, domains: MemoryDomains) -> SbootResult<()>;

    fn restart_watchdog(&mut self);

    /// Request the PMU to enter its sleep loop
    fn pmu_trigger_ipi(&mut self);

    fn pmu_sleeping(&mut self) -> bool;

    /// Wake the PMU after its firmware was loaded
    fn pmu_wake(&mut self);

    fn pmu_fw_present(&mut self) -> bool;
}
