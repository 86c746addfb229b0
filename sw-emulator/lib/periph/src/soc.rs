/*++

Licensed under the Apache-2.0 license.

File Name:

    soc.rs

Abstract:

    File contains the emulated SoC bundling every boot loader collaborator.

--*/

use crate::{
    BootDevice, EmuCipher, EmuHash, EmuPlatform, EmuRsa, EmuSink, Fabric, MemoryMap, Pmu,
    PowerState, DEFAULT_DDR_SIZE,
};
use sboot_drivers::MemoryDomains;
use sboot_image_types::AesKeyBytes;

pub struct SocArgs {
    pub image: Vec<u8>,
    pub device_key: Option<AesKeyBytes>,
    pub ddr_size: usize,

    /// Domains powered at reset
    pub powered: MemoryDomains,

    pub fabric: Fabric,
    pub pmu: Pmu,
}

impl Default for SocArgs {
    fn default() -> Self {
        Self {
            image: Vec::new(),
            device_key: None,
            ddr_size: DEFAULT_DDR_SIZE,
            powered: MemoryDomains::empty(),
            fabric: Fabric::default(),
            pmu: Pmu::default(),
        }
    }
}

pub struct EmuSoc {
    pub hash: EmuHash,
    pub rsa: EmuRsa,
    pub cipher: EmuCipher,
    pub device: BootDevice,
    pub sink: EmuSink,
    pub platform: EmuPlatform,
}

impl EmuSoc {
    pub fn new(args: SocArgs) -> Self {
        let power = PowerState::default();
        power.set(args.powered);
        Self {
            hash: EmuHash::default(),
            rsa: EmuRsa::default(),
            cipher: EmuCipher::new(args.device_key),
            device: BootDevice::new(args.image),
            sink: EmuSink {
                memory: MemoryMap::new(args.ddr_size, power.clone()),
                fabric: args.fabric,
            },
            platform: EmuPlatform::new(power, args.pmu),
        }
    }
}
