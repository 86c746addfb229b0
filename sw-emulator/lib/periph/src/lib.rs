/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the boot loader emulator peripheral library.

--*/

mod aes;
mod boot_device;
mod fabric;
mod hash;
mod memory;
mod platform;
mod pmu;
mod rsa;
mod soc;

pub use aes::EmuCipher;
pub use boot_device::{BootDevice, Tamper};
pub use fabric::Fabric;
pub use hash::EmuHash;
pub use memory::{MemoryMap, MemoryRegion, PowerState, EmuSink};
pub use platform::EmuPlatform;
pub use pmu::Pmu;
pub use rsa::EmuRsa;
pub use soc::{EmuSoc, SocArgs};

/// Base of the R5-0 TCM window in the global address map
pub const R5_0_TCM_BASE: u64 = 0xFFE0_0000;

/// Size of the R5-0 TCM window, large enough for the lockstep layout
pub const R5_0_TCM_WINDOW: usize = 0x4_0000;

pub const R5_1_TCM_BASE: u64 = 0xFFE9_0000;
pub const R5_1_TCM_WINDOW: usize = 0x3_0000;

/// PMU firmware RAM
pub const PMU_RAM_BASE: u64 = 0xFFDC_0000;
pub const PMU_RAM_SIZE: usize = 0x2_0000;

pub const OCM_BASE: u64 = 0xFFFC_0000;
pub const OCM_SIZE: usize = 0x4_0000;

pub const DDR_BASE: u64 = 0;
pub const DEFAULT_DDR_SIZE: usize = 8 * 1024 * 1024;
