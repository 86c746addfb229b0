/*++

Licensed under the Apache-2.0 license.

File Name:

    boot_device.rs

Abstract:

    File contains the API to read the boot image from the boot device.

--*/

use sboot_error::SbootResult;

pub trait DeviceCopy {
    /// Copy `dst.len()` bytes starting at `src_offset` of the boot device
    fn copy(&mut self, src_offset: u64, dst: &mut [u8]) -> SbootResult<()>;
}
