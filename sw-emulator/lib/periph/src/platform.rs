/*++

Licensed under the Apache-2.0 license.

File Name:

    platform.rs

Abstract:

    File contains the emulated power, watchdog and PMU services.

--*/

use crate::{PowerState, Pmu};
use sboot_drivers::{MemoryDomains, Platform};
use sboot_error::{SbootError, SbootResult};

pub struct EmuPlatform {
    power: PowerState,
    pub pmu: Pmu,

    /// Domains passed to every `power_up_memory` call
    pub power_ups: Vec<MemoryDomains>,

    /// Domains passed to every `init_memory_ecc` call
    pub ecc_inits: Vec<MemoryDomains>,

    pub watchdog_restarts: usize,

    /// Power up requests fail
    pub power_up_fails: bool,
}

impl EmuPlatform {
    pub fn new(power: PowerState, pmu: Pmu) -> Self {
        Self {
            power,
            pmu,
            power_ups: Vec::new(),
            ecc_inits: Vec::new(),
            watchdog_restarts: 0,
            power_up_fails: false,
        }
    }

    pub fn powered(&self) -> MemoryDomains {
        self.power.get()
    }
}

impl Platform for EmuPlatform {
    fn power_up_memory(&mut self, domains: MemoryDomains) -> SbootResult<()> {
        self.power_ups.push(domains);
        if self.power_up_fails {
            Err(SbootError::DRIVER_MEMORY_DOMAIN_UNPOWERED)?;
        }
        self.power.set(self.power.get() | domains);
        Ok(())
    }

    fn init_memory_ecc(&mut self, domains: MemoryDomains) -> SbootResult<()> {
        if !self.power.get().contains(domains) {
            Err(SbootError::DRIVER_MEMORY_DOMAIN_UNPOWERED)?;
        }
        self.ecc_inits.push(domains);
        Ok(())
    }

    fn restart_watchdog(&mut self) {
        self.watchdog_restarts += 1;
    }

    fn pmu_trigger_ipi(&mut self) {
        self.pmu.trigger_ipi()
    }

    fn pmu_sleeping(&mut self) -> bool {
        self.pmu.sleeping()
    }

    fn pmu_wake(&mut self) {
        self.pmu.wake()
    }

    fn pmu_fw_present(&mut self) -> bool {
        self.pmu.fw_present()
    }
}
