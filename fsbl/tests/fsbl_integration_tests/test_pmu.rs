// Licensed under the Apache-2.0 license

use crate::helpers::*;
use sboot_emu_periph::{Pmu, SocArgs, PMU_RAM_BASE};
use sboot_error::SbootError;
use sboot_fsbl::LoaderConfig;
use sboot_image_fake_keys::DEVICE_AES_KEY;
use sboot_image_gen::ImageGeneratorPartition;
use sboot_image_types::DestinationCpu;

fn pmu_partition(offset: u64, data: Vec<u8>) -> ImageGeneratorPartition {
    ImageGeneratorPartition {
        payload: data,
        dest_cpu: DestinationCpu::Pmu,
        load_addr: PMU_RAM_BASE + offset,
        exec_addr: PMU_RAM_BASE,
        ..Default::default()
    }
}

fn pmu_soc(image: Vec<u8>, pmu: Pmu) -> TestSoc {
    TestSoc::with_args(SocArgs {
        image,
        device_key: Some(DEVICE_AES_KEY),
        pmu,
        ..Default::default()
    })
}

#[test]
fn test_pmu_released_after_last_pmu_partition() {
    let code = payload(0x2000, 30);
    let data = payload(0x800, 31);
    let partitions = vec![
        pmu_partition(0, code.clone()),
        pmu_partition(0x8000, data.clone()),
        ddr_partition(payload(128, 32)),
    ];
    let image = build_image(&image_config(partitions));
    let mut soc = pmu_soc(
        image,
        Pmu::with_latency(3),
    );

    let summary = soc.boot(LoaderConfig::default()).unwrap();
    assert_eq!(summary.loaded, 3);
    assert_eq!(soc.memory(PMU_RAM_BASE, code.len()), &code[..]);
    assert_eq!(soc.memory(PMU_RAM_BASE + 0x8000, data.len()), &data[..]);

    let pmu = &soc.soc.platform.pmu;
    assert_eq!(pmu.ipis, 2);
    assert_eq!(pmu.wakes, 1);
    // PMU firmware is not handed off like an application CPU
    assert!(summary.handoff.get(DestinationCpu::Pmu).is_none());
    assert_eq!(summary.handoff.len(), 1);
}

#[test]
fn test_pmu_sleep_timeout() {
    let image = build_image(&image_config(vec![pmu_partition(0, payload(256, 33))]));
    let mut soc = pmu_soc(
        image,
        Pmu::with_no_response(),
    );

    let config = LoaderConfig {
        pmu_polls: 100,
        ..Default::default()
    };
    assert_eq!(
        soc.boot(config).err(),
        Some(SbootError::LOADER_PMU_SLEEP_TIMEOUT)
    );
    assert!(soc.memory(PMU_RAM_BASE, 256).iter().all(|b| *b == 0));
}

#[test]
fn test_pmu_without_entry_point_waits_for_sleep() {
    let data = payload(512, 34);
    let partition = ImageGeneratorPartition {
        exec_addr: 0,
        ..pmu_partition(0, data.clone())
    };
    let image = build_image(&image_config(vec![partition]));

    // Idle PMU ROM is already asleep, no IPI needed
    let mut soc = pmu_soc(image.clone(), Pmu::default());
    soc.boot(LoaderConfig::default()).unwrap();
    assert_eq!(soc.memory(PMU_RAM_BASE, data.len()), &data[..]);
    let pmu = &soc.soc.platform.pmu;
    assert_eq!(pmu.ipis, 0);
    assert!(pmu.sleep_polls >= 1);
    assert_eq!(pmu.wakes, 1);

    // Running firmware is never asked to sleep, so the wait expires
    let mut soc = pmu_soc(image, Pmu::with_latency(0));
    let config = LoaderConfig {
        pmu_polls: 20,
        ..Default::default()
    };
    assert_eq!(
        soc.boot(config).err(),
        Some(SbootError::LOADER_PMU_SLEEP_TIMEOUT)
    );
    assert_eq!(soc.soc.platform.pmu.ipis, 0);
    assert!(soc.memory(PMU_RAM_BASE, data.len()).iter().all(|b| *b == 0));
}
