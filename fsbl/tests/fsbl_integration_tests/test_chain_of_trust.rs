// Licensed under the Apache-2.0 license

use crate::helpers::*;
use sboot_error::SbootError;
use sboot_fsbl::LoaderConfig;
use sboot_image_gen::ImageGeneratorPartition;
use sboot_image_types::{
    AuthCertificate, DestinationCpu, DestinationDevice, AUTH_CERT_BYTE_SIZE,
};

fn signed_partition(len: usize) -> ImageGeneratorPartition {
    ImageGeneratorPartition {
        authenticate: true,
        ..ddr_partition(payload(len, 60))
    }
}

fn cert_offset(image: &[u8], index: usize) -> usize {
    partition_header(image, index).auth_cert_word_offset() as usize * 4
}

#[test]
fn test_unpinned_ppk_accepted() {
    let mut config = image_config(vec![signed_partition(2048)]);
    config.keys = Some(foreign_keys());
    let image = build_image(&config);

    let mut soc = TestSoc::new(image);
    assert!(soc.boot(LoaderConfig::default()).is_ok());
}

#[test]
fn test_foreign_ppk_rejected() {
    let mut config = image_config(vec![signed_partition(2048)]);
    config.keys = Some(foreign_keys());
    let image = build_image(&config);

    let mut soc = TestSoc::new(image);
    assert_eq!(
        soc.boot(pinned_config()).err(),
        Some(SbootError::PPK_DIGEST_MISMATCH)
    );
    // Rejected on the pin alone
    assert_eq!(soc.soc.rsa.operations, 0);
}

#[test]
fn test_substituted_spk_rejected() {
    let mut image = build_image(&image_config(vec![signed_partition(2048)]));
    let spk = AuthCertificate::spk_range();
    let offset = cert_offset(&image, 0) + spk.start as usize + 17;
    image[offset] ^= 0x04;

    let mut soc = TestSoc::new(image);
    assert_eq!(
        soc.boot(pinned_config()).err(),
        Some(SbootError::SPK_SIGNATURE_INVALID)
    );
}

#[test]
fn test_block_signature_rejected() {
    let partition = ImageGeneratorPartition {
        payload: payload(12 * 1024, 61),
        dest_cpu: DestinationCpu::None,
        dest_device: DestinationDevice::Pl,
        authenticate: true,
        block_size_code: 1,
        ..Default::default()
    };
    let mut image = build_image(&image_config(vec![partition]));
    // Last byte of the third block certificate's partition signature
    let offset = cert_offset(&image, 0) + 3 * AUTH_CERT_BYTE_SIZE - 1;
    image[offset] ^= 0x01;

    let mut soc = TestSoc::new(image);
    assert_eq!(
        soc.boot(pinned_config()).err(),
        Some(SbootError::PARTITION_SIGNATURE_INVALID)
    );
    let fabric = &soc.soc.sink.fabric;
    assert_eq!(fabric.resets, 1);
    assert!(fabric.received().is_empty());
}

#[test]
fn test_cert_spans_image_end() {
    let mut image = build_image(&image_config(vec![signed_partition(2048)]));
    let len = image.len() - AUTH_CERT_BYTE_SIZE / 2;
    image.truncate(len);

    let mut soc = TestSoc::new(image);
    assert_eq!(
        soc.boot(pinned_config()).err(),
        Some(SbootError::LOADER_DEVICE_COPY_FAILED)
    );
}
