// Licensed under the Apache-2.0 license

use crate::helpers::*;
use sboot_emu_periph::{Fabric, SocArgs, Tamper};
use sboot_error::SbootError;
use sboot_fsbl::{LoaderConfig, PartitionLoader, PartitionOutcome, ResetReason};
use sboot_image_fake_keys::DEVICE_AES_KEY;
use sboot_image_gen::ImageGeneratorPartition;
use sboot_image_types::{DestinationCpu, DestinationDevice, HashAlgorithm};
use sboot_image_verify::SkipReason;

/// 4 KiB << 3
const BLOCK_SIZE_CODE_32K: u8 = 4;

fn pl_partition(data: Vec<u8>) -> ImageGeneratorPartition {
    ImageGeneratorPartition {
        payload: data,
        dest_cpu: DestinationCpu::None,
        dest_device: DestinationDevice::Pl,
        ..Default::default()
    }
}

fn fabric_soc(image: Vec<u8>, fabric: Fabric) -> TestSoc {
    TestSoc::with_args(SocArgs {
        image,
        device_key: Some(DEVICE_AES_KEY),
        fabric,
        ..Default::default()
    })
}

#[test]
fn test_plain_bitstream() {
    let data = payload(50 * 1024, 40);
    let image = build_image(&image_config(vec![pl_partition(data.clone())]));
    let mut soc = fabric_soc(
        image,
        Fabric::with_transfer_latency(2),
    );

    let summary = soc.boot(LoaderConfig::default()).unwrap();
    assert_eq!(summary.loaded, 1);
    assert_eq!(soc.fabric_data(), &data[..]);
    assert_eq!(soc.soc.sink.fabric.pushes, 13);
    // Bitstreams have no CPU to hand off to
    assert!(summary.handoff.is_empty());
}

#[test]
fn test_checksummed_bitstream() {
    let data = payload(9 * 1024, 41);
    let partition = ImageGeneratorPartition {
        checksum: true,
        ..pl_partition(data.clone())
    };
    let image = build_image(&image_config(vec![partition]));

    let mut soc = fabric_soc(image.clone(), Fabric::default());
    soc.boot(LoaderConfig::default()).unwrap();
    assert_eq!(soc.fabric_data(), &data[..]);

    let mut corrupted = image;
    let offset = data_offset(&corrupted, 0);
    corrupted[offset + 9000] ^= 0x10;
    let mut soc = fabric_soc(corrupted, Fabric::default());
    assert_eq!(
        soc.boot(LoaderConfig::default()).err(),
        Some(SbootError::CHECKSUM_MISMATCH)
    );
    // Verified before the first byte reaches the fabric
    assert_eq!(soc.soc.sink.fabric.pushes, 0);
}

#[test]
fn test_encrypted_bitstream() {
    let data = payload(40 * 1024, 42);
    let partition = ImageGeneratorPartition {
        encrypt: true,
        key_roll_block_len: 10 * 1024,
        iv_fragment: 9,
        ..pl_partition(data.clone())
    };
    let image = build_image(&image_config(vec![partition]));
    let mut soc = fabric_soc(image, Fabric::default());

    soc.boot(LoaderConfig::default()).unwrap();
    assert_eq!(soc.fabric_data(), &data[..]);
}

#[test]
fn test_block_authenticated_bitstream() {
    let data = payload(100 * 1024, 43);
    let partition = ImageGeneratorPartition {
        authenticate: true,
        block_size_code: BLOCK_SIZE_CODE_32K,
        ..pl_partition(data.clone())
    };
    let image = build_image(&image_config(vec![partition]));
    let mut soc = fabric_soc(image, Fabric::default());

    let summary = soc.boot(pinned_config()).unwrap();
    assert_eq!(summary.loaded, 1);
    assert_eq!(soc.fabric_data(), &data[..]);
    // One SPK and one partition signature per block
    assert_eq!(soc.soc.rsa.operations, 8);
    assert_eq!(soc.soc.sink.fabric.pushes, 25);
}

#[test]
fn test_block_authenticated_sha2_bitstream() {
    let data = payload(20 * 1024, 44);
    let partition = ImageGeneratorPartition {
        authenticate: true,
        block_size_code: 1,
        ..pl_partition(data.clone())
    };
    let mut config = image_config(vec![partition]);
    config.hash_alg = HashAlgorithm::Sha2_256;
    let image = build_image(&config);
    let mut soc = fabric_soc(image, Fabric::default());

    soc.boot(pinned_config()).unwrap();
    assert_eq!(soc.fabric_data(), &data[..]);
}

#[test]
fn test_block_authenticated_encrypted_bitstream() {
    let data = payload(100 * 1024, 45);
    let partition = ImageGeneratorPartition {
        authenticate: true,
        encrypt: true,
        key_roll_block_len: 32 * 1024,
        block_size_code: BLOCK_SIZE_CODE_32K,
        ..pl_partition(data.clone())
    };
    let image = build_image(&image_config(vec![partition]));
    let mut soc = fabric_soc(image, Fabric::default());

    soc.boot(pinned_config()).unwrap();
    assert_eq!(soc.fabric_data(), &data[..]);
    // Ciphertext and secure headers still fit in four 32 KiB blocks
    assert_eq!(soc.soc.rsa.operations, 8);
    assert!(!soc.soc.cipher.has_rolled_key());
}

#[test]
fn test_tamper_between_passes() {
    let data = payload(100 * 1024, 46);
    let partition = ImageGeneratorPartition {
        authenticate: true,
        block_size_code: BLOCK_SIZE_CODE_32K,
        ..pl_partition(data)
    };
    let image = build_image(&image_config(vec![partition]));
    // Third block, flipped right after the hashing pass reads it
    let offset = (data_offset(&image, 0) + 70 * 1024) as u64;
    let mut soc = fabric_soc(image, Fabric::default());
    soc.soc.device.set_tamper(Tamper { offset, mask: 0x01 });

    assert_eq!(
        soc.boot(pinned_config()).err(),
        Some(SbootError::BLOCK_AUTH_CHUNK_HASH_MISMATCH)
    );
    let fabric = &soc.soc.sink.fabric;
    assert_eq!(fabric.resets, 1);
    assert!(fabric.received().is_empty());
}

#[test]
fn test_secure_bitstream_requires_block_size() {
    let partition = ImageGeneratorPartition {
        authenticate: true,
        ..pl_partition(payload(8 * 1024, 47))
    };
    let image = build_image(&image_config(vec![partition]));
    let mut soc = fabric_soc(image, Fabric::default());

    assert_eq!(
        soc.boot(pinned_config()).err(),
        Some(SbootError::BLOCK_AUTH_BLOCK_SIZE_ZERO)
    );
}

#[test]
fn test_ps_only_reset_keeps_pl() {
    let image = build_image(&image_config(vec![
        pl_partition(payload(4096, 48)),
        ddr_partition(payload(64, 49)),
    ]));
    let mut soc = fabric_soc(image, Fabric::default());

    let config = LoaderConfig {
        reset_reason: ResetReason::PsOnly,
        ..Default::default()
    };
    let summary = soc.boot(config).unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.loaded, 1);
    assert_eq!(soc.soc.sink.fabric.pushes, 0);
}

#[test]
fn test_fabric_timeouts() {
    let image = build_image(&image_config(vec![pl_partition(payload(4096, 50))]));
    let config = LoaderConfig {
        fabric_chunk_polls: 50,
        fabric_done_polls: 50,
        ..Default::default()
    };

    let mut soc = fabric_soc(
        image.clone(),
        Fabric::with_stuck_transfer(),
    );
    assert_eq!(
        soc.boot(config).err(),
        Some(SbootError::LOADER_FABRIC_CHUNK_TIMEOUT)
    );
    assert_eq!(soc.soc.sink.fabric.resets, 1);

    let mut soc = fabric_soc(
        image,
        Fabric::with_stuck_done(),
    );
    assert_eq!(
        soc.boot(config).err(),
        Some(SbootError::LOADER_FABRIC_DONE_TIMEOUT)
    );
    assert_eq!(soc.soc.sink.fabric.resets, 1);
}

#[test]
fn test_partition_outcome() {
    let image = build_image(&image_config(vec![pl_partition(payload(4096, 51))]));
    let mut soc = fabric_soc(image, Fabric::default());
    let config = LoaderConfig {
        reset_reason: ResetReason::PsOnly,
        ..Default::default()
    };

    let env = soc.env();
    let mut loader = PartitionLoader::new(env, config);
    let boot = loader.read_boot_header().unwrap();
    assert_eq!(
        loader.load_partition(&boot, 0),
        Ok(PartitionOutcome::Skipped(SkipReason::PsOnlyReset))
    );
}
