// Licensed under the Apache-2.0 license

use crate::helpers::*;
use sboot_drivers::MemoryDomains;
use sboot_error::SbootError;
use sboot_fsbl::dest::{R5_0_ATCM_GLOBAL, R5_1_ATCM_GLOBAL};
use sboot_fsbl::LoaderConfig;
use sboot_image_gen::ImageGeneratorPartition;
use sboot_image_types::DestinationCpu;

fn r5_partition(cpu: DestinationCpu, load_addr: u64, data: Vec<u8>) -> ImageGeneratorPartition {
    ImageGeneratorPartition {
        payload: data,
        dest_cpu: cpu,
        load_addr,
        exec_addr: 0,
        ..Default::default()
    }
}

#[test]
fn test_r5_tcm_remapped_and_powered() {
    let atcm = payload(4096, 20);
    let btcm = payload(2048, 21);
    let partitions = vec![
        r5_partition(DestinationCpu::R5_0, 0, atcm.clone()),
        r5_partition(DestinationCpu::R5_1, 0x2_0000, btcm.clone()),
    ];
    let image = build_image(&image_config(partitions));
    let mut soc = TestSoc::new(image);

    let summary = soc.boot(LoaderConfig::default()).unwrap();
    assert_eq!(summary.loaded, 2);
    assert_eq!(soc.memory(R5_0_ATCM_GLOBAL, atcm.len()), &atcm[..]);
    assert_eq!(soc.memory(R5_1_ATCM_GLOBAL + 0x2_0000, btcm.len()), &btcm[..]);

    let platform = &soc.soc.platform;
    assert_eq!(
        platform.power_ups,
        vec![MemoryDomains::R5_0_TCM, MemoryDomains::R5_1_TCM]
    );
    assert_eq!(platform.ecc_inits, platform.power_ups);
    assert!(summary.handoff.get(DestinationCpu::R5_0).is_some());
    assert!(summary.handoff.get(DestinationCpu::R5_1).is_some());
}

#[test]
fn test_lockstep_spans_banks() {
    let data = payload(0x1_8000, 22);
    let image = build_image(&image_config(vec![r5_partition(
        DestinationCpu::R5Lockstep,
        0,
        data.clone(),
    )]));
    let mut soc = TestSoc::new(image);

    soc.boot(LoaderConfig::default()).unwrap();
    assert_eq!(soc.memory(R5_0_ATCM_GLOBAL, data.len()), &data[..]);
    assert_eq!(
        soc.soc.platform.power_ups,
        vec![MemoryDomains::R5_LOCKSTEP_TCM]
    );
}

#[test]
fn test_tcm_bank_overflow() {
    let image = build_image(&image_config(vec![r5_partition(
        DestinationCpu::R5_0,
        0xF000,
        payload(0x2000, 23),
    )]));
    let mut soc = TestSoc::new(image);

    assert_eq!(
        soc.boot(LoaderConfig::default()).err(),
        Some(SbootError::DEST_ADDRESS_OUT_OF_RANGE)
    );
    assert!(soc.soc.platform.power_ups.is_empty());
}

#[test]
fn test_power_up_failure() {
    let image = build_image(&image_config(vec![r5_partition(
        DestinationCpu::R5_1,
        0,
        payload(64, 24),
    )]));
    let mut soc = TestSoc::new(image);
    soc.soc.platform.power_up_fails = true;

    assert_eq!(
        soc.boot(LoaderConfig::default()).err(),
        Some(SbootError::DEST_MEMORY_POWER_UP_FAILED)
    );
}
