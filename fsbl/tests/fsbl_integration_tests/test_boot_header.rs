// Licensed under the Apache-2.0 license

use crate::helpers::*;
use sboot_error::SbootError;
use sboot_fsbl::LoaderConfig;
use sboot_image_types::{BootHeader, BOOT_HEADER_BYTE_SIZE};
use zerocopy::{AsBytes, FromBytes};

fn image() -> Vec<u8> {
    build_image(&image_config(vec![ddr_partition(payload(1024, 70))]))
}

fn rewrite_boot_header(image: &mut [u8], edit: impl FnOnce(&mut BootHeader)) {
    let mut header = BootHeader::read_from(&image[..BOOT_HEADER_BYTE_SIZE]).unwrap();
    edit(&mut header);
    header.set_checksum(header.calc_checksum());
    image[..BOOT_HEADER_BYTE_SIZE].copy_from_slice(header.as_bytes());
}

#[test]
fn test_marker_and_checksum() {
    let mut bad_marker = image();
    rewrite_boot_header(&mut bad_marker, |h| {
        h.set_marker(0);
    });
    let mut soc = TestSoc::new(bad_marker);
    assert_eq!(
        soc.boot(LoaderConfig::default()).err(),
        Some(SbootError::BOOT_HEADER_MARKER_MISMATCH)
    );

    let mut bad_checksum = image();
    bad_checksum[8] ^= 0x01;
    let mut soc = TestSoc::new(bad_checksum);
    assert_eq!(
        soc.boot(LoaderConfig::default()).err(),
        Some(SbootError::BOOT_HEADER_CHECKSUM_INVALID)
    );
}

#[test]
fn test_partition_count_bounds() {
    let mut none = image();
    rewrite_boot_header(&mut none, |h| {
        h.set_partition_count(0);
    });
    let mut soc = TestSoc::new(none);
    assert_eq!(
        soc.boot(LoaderConfig::default()).err(),
        Some(SbootError::BOOT_HEADER_PARTITION_COUNT_INVALID)
    );

    let mut too_many = image();
    rewrite_boot_header(&mut too_many, |h| {
        h.set_partition_count(33);
    });
    let mut soc = TestSoc::new(too_many);
    assert_eq!(
        soc.boot(LoaderConfig::default()).err(),
        Some(SbootError::BOOT_HEADER_PARTITION_COUNT_INVALID)
    );
}

#[test]
fn test_corrupted_partition_header() {
    let mut image = image();
    // Load address word of the first partition header
    image[0x40 + 24] ^= 0x01;
    let mut soc = TestSoc::new(image);
    assert_eq!(
        soc.boot(LoaderConfig::default()).err(),
        Some(SbootError::HEADER_CHECKSUM_INVALID)
    );
}
