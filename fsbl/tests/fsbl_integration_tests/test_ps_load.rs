// Licensed under the Apache-2.0 license

use crate::helpers::*;
use sboot_emu_periph::SocArgs;
use sboot_error::SbootError;
use sboot_fsbl::LoaderConfig;
use sboot_image_gen::ImageGeneratorPartition;
use sboot_image_types::{DestinationCpu, HashAlgorithm, PartitionOwner};
use sboot_image_verify::ExecState;

#[test]
fn test_plain_ddr_load() {
    let data = payload(6000, 1);
    let image = build_image(&image_config(vec![ddr_partition(data.clone())]));
    let mut soc = TestSoc::new(image);

    let summary = soc.boot(LoaderConfig::default()).unwrap();
    assert_eq!(summary.loaded, 1);
    assert_eq!(soc.memory(DDR_LOAD_ADDR, data.len()), &data[..]);

    let entry = summary.handoff.get(DestinationCpu::A53_0).unwrap();
    assert_eq!(entry.entry_address, DDR_LOAD_ADDR);
    assert_eq!(entry.exec_state, ExecState::Aarch64);
    assert_eq!(soc.soc.platform.watchdog_restarts, 1);
}

#[test]
fn test_checksummed_load() {
    let data = payload(9000, 2);
    let partition = ImageGeneratorPartition {
        checksum: true,
        ..ddr_partition(data.clone())
    };
    let image = build_image(&image_config(vec![partition]));

    let mut soc = TestSoc::new(image.clone());
    soc.boot(LoaderConfig::default()).unwrap();
    assert_eq!(soc.memory(DDR_LOAD_ADDR, data.len()), &data[..]);

    let mut corrupted = image;
    let offset = data_offset(&corrupted, 0);
    corrupted[offset + 4321] ^= 0x01;
    let mut soc = TestSoc::new(corrupted);
    assert_eq!(
        soc.boot(LoaderConfig::default()).err(),
        Some(SbootError::CHECKSUM_MISMATCH)
    );
    // Nothing of a rejected partition stays in memory
    assert!(soc.memory(DDR_LOAD_ADDR, data.len()).iter().all(|b| *b == 0));
}

#[test]
fn test_authenticated_load() {
    let data = payload(20000, 3);
    let partition = ImageGeneratorPartition {
        authenticate: true,
        ..ddr_partition(data.clone())
    };
    let image = build_image(&image_config(vec![partition]));

    let mut soc = TestSoc::new(image.clone());
    let summary = soc.boot(pinned_config()).unwrap();
    assert_eq!(summary.loaded, 1);
    assert_eq!(soc.memory(DDR_LOAD_ADDR, data.len()), &data[..]);

    let mut tampered = image;
    let offset = data_offset(&tampered, 0);
    tampered[offset + 100] ^= 0x80;
    let mut soc = TestSoc::new(tampered);
    assert_eq!(
        soc.boot(pinned_config()).err(),
        Some(SbootError::PARTITION_SIGNATURE_INVALID)
    );
    assert!(soc.memory(DDR_LOAD_ADDR, data.len()).iter().all(|b| *b == 0));
}

#[test]
fn test_authenticated_sha2_load() {
    let data = payload(9000, 13);
    let partition = ImageGeneratorPartition {
        authenticate: true,
        ..ddr_partition(data.clone())
    };
    let mut config = image_config(vec![partition]);
    config.hash_alg = HashAlgorithm::Sha2_256;
    let image = build_image(&config);

    // Signed over SHA2-256, so a SHA3-384 check would reject it
    let mut soc = TestSoc::new(image);
    let summary = soc.boot(pinned_config()).unwrap();
    assert_eq!(summary.loaded, 1);
    assert_eq!(soc.memory(DDR_LOAD_ADDR, data.len()), &data[..]);
}

#[test]
fn test_encrypted_load() {
    let data = payload(12288, 4);
    let partition = ImageGeneratorPartition {
        encrypt: true,
        key_roll_block_len: 4096,
        iv_fragment: 3,
        ..ddr_partition(data.clone())
    };
    let image = build_image(&image_config(vec![partition]));
    let mut soc = TestSoc::new(image);

    let summary = soc.boot(LoaderConfig::default()).unwrap();
    assert_eq!(summary.loaded, 1);
    assert_eq!(soc.memory(DDR_LOAD_ADDR, data.len()), &data[..]);
    // Key rolled slot cleared once the last block is out
    assert!(!soc.soc.cipher.has_rolled_key());
}

#[test]
fn test_encrypted_load_wrong_device_key() {
    let data = payload(4096, 5);
    let partition = ImageGeneratorPartition {
        encrypt: true,
        ..ddr_partition(data.clone())
    };
    let image = build_image(&image_config(vec![partition]));
    let mut soc = TestSoc::with_args(SocArgs {
        image,
        device_key: Some([0x5A; 32]),
        ..Default::default()
    });

    assert_eq!(
        soc.boot(LoaderConfig::default()).err(),
        Some(SbootError::DECRYPT_TAG_MISMATCH)
    );
    let tail = data.len() + 1024;
    assert!(soc.memory(DDR_LOAD_ADDR, tail).iter().all(|b| *b == 0));
}

#[test]
fn test_authenticated_encrypted_load() {
    let data = payload(30000, 6);
    let partition = ImageGeneratorPartition {
        authenticate: true,
        encrypt: true,
        key_roll_block_len: 8192,
        ..ddr_partition(data.clone())
    };
    let image = build_image(&image_config(vec![partition]));
    let mut soc = TestSoc::new(image);

    let summary = soc.boot(pinned_config()).unwrap();
    assert_eq!(summary.loaded, 1);
    assert_eq!(soc.memory(DDR_LOAD_ADDR, data.len()), &data[..]);
}

#[test]
fn test_image_offset() {
    let data = payload(2048, 7);
    let image = build_image(&image_config(vec![ddr_partition(data.clone())]));
    let mut device = vec![0xFF; 0x8000];
    device.extend_from_slice(&image);
    let mut soc = TestSoc::new(device);

    soc.boot(LoaderConfig {
        image_offset: 0x8000,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(soc.memory(DDR_LOAD_ADDR, data.len()), &data[..]);
}

#[test]
fn test_owner_skip_and_first_handoff_wins() {
    let first = payload(1024, 8);
    let second = payload(1024, 9);
    let partitions = vec![
        ImageGeneratorPartition {
            owner: PartitionOwner::UBoot,
            load_addr: 0x20_0000,
            ..ddr_partition(payload(512, 10))
        },
        ImageGeneratorPartition {
            aarch32: true,
            ..ddr_partition(first.clone())
        },
        ImageGeneratorPartition {
            load_addr: 0x30_0000,
            exec_addr: 0x30_0000,
            ..ddr_partition(second.clone())
        },
    ];
    let image = build_image(&image_config(partitions));
    let mut soc = TestSoc::new(image);

    let summary = soc.boot(LoaderConfig::default()).unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.loaded, 2);
    assert!(soc.memory(0x20_0000, 512).iter().all(|b| *b == 0));
    assert_eq!(soc.memory(0x30_0000, second.len()), &second[..]);

    assert_eq!(summary.handoff.len(), 1);
    let entry = summary.handoff.get(DestinationCpu::A53_0).unwrap();
    assert_eq!(entry.entry_address, DDR_LOAD_ADDR);
    assert_eq!(entry.exec_state, ExecState::Aarch32);
}

#[test]
fn test_execute_in_place() {
    let partitions = vec![ImageGeneratorPartition {
        dest_cpu: DestinationCpu::A53_1,
        exec_addr: 0xC000_0000,
        execute_in_place: true,
        ..Default::default()
    }];
    let image = build_image(&image_config(partitions));
    let mut soc = TestSoc::new(image);

    let summary = soc.boot(LoaderConfig::default()).unwrap();
    assert_eq!(summary.loaded, 1);
    let entry = summary.handoff.get(DestinationCpu::A53_1).unwrap();
    assert_eq!(entry.entry_address, 0xC000_0000);
}

#[test]
fn test_no_destination_cpu_runs_on_loader_cpu() {
    let data = payload(256, 11);
    let partition = ImageGeneratorPartition {
        dest_cpu: DestinationCpu::None,
        ..ddr_partition(data.clone())
    };
    let image = build_image(&image_config(vec![partition]));
    let mut soc = TestSoc::new(image);

    let summary = soc
        .boot(LoaderConfig {
            running_cpu: DestinationCpu::A53_2,
            ..Default::default()
        })
        .unwrap();
    assert!(summary.handoff.get(DestinationCpu::A53_2).is_some());
}

#[test]
fn test_device_read_failure() {
    let image = build_image(&image_config(vec![ddr_partition(payload(4096, 12))]));
    let mut soc = TestSoc::new(image);
    // Boot header and partition header only
    soc.soc.device.fail_after_reads = Some(2);

    assert_eq!(
        soc.boot(LoaderConfig::default()).err(),
        Some(SbootError::LOADER_DEVICE_COPY_FAILED)
    );
}
