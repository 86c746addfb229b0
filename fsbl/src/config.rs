/*++

Licensed under the Apache-2.0 license.

File Name:

    config.rs

Abstract:

    Loader configuration.

--*/

use sboot_image_types::{DestinationCpu, Digest};

pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;
pub const DEFAULT_PMU_POLLS: u32 = 0x10_0000;
pub const DEFAULT_FABRIC_CHUNK_POLLS: u32 = 0x10_0000;
pub const DEFAULT_FABRIC_DONE_POLLS: u32 = 0x100_0000;

/// Reset Reason
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ResetReason {
    /// Whole system reset
    #[default]
    System,

    /// Processing system only; the programmable logic keeps its configuration
    PsOnly,
}

#[derive(Debug, Clone, Copy)]
pub struct LoaderConfig {
    /// CPU running the loader
    pub running_cpu: DestinationCpu,

    pub reset_reason: ResetReason,

    /// Offset of the boot image on the boot device
    pub image_offset: u64,

    /// Copy and hash granularity in bytes
    pub chunk_size: usize,

    /// Provisioned SHA3-384 digest of the PPK
    pub ppk_digest: Option<Digest>,

    pub pmu_polls: u32,
    pub fabric_chunk_polls: u32,
    pub fabric_done_polls: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            running_cpu: DestinationCpu::A53_0,
            reset_reason: ResetReason::System,
            image_offset: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            ppk_digest: None,
            pmu_polls: DEFAULT_PMU_POLLS,
            fabric_chunk_polls: DEFAULT_FABRIC_CHUNK_POLLS,
            fabric_done_polls: DEFAULT_FABRIC_DONE_POLLS,
        }
    }
}
