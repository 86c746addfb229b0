/*++

Licensed under the Apache-2.0 license.

File Name:

    boot_device.rs

Abstract:

    File contains the emulated boot device holding the boot image.

--*/

use sboot_drivers::DeviceCopy;
use sboot_error::{SbootError, SbootResult};

/// Modification applied to the boot device after it was first read
///
/// Once a read covering `offset` completes, the byte at `offset` is XORed
/// with `mask`. Models a device whose content changes between two reads.
#[derive(Debug, Copy, Clone)]
pub struct Tamper {
    pub offset: u64,
    pub mask: u8,
}

#[derive(Default)]
pub struct BootDevice {
    image: Vec<u8>,
    tamper: Option<Tamper>,

    /// Number of copy requests served
    pub reads: usize,

    /// Fail every read issued after this many successful ones
    pub fail_after_reads: Option<usize>,
}

impl BootDevice {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            ..Default::default()
        }
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut Vec<u8> {
        &mut self.image
    }

    /// Arm a one-shot modification
    pub fn set_tamper(&mut self, tamper: Tamper) {
        self.tamper = Some(tamper);
    }
}

impl DeviceCopy for BootDevice {
    fn copy(&mut self, src_offset: u64, dst: &mut [u8]) -> SbootResult<()> {
        if let Some(limit) = self.fail_after_reads {
            if self.reads >= limit {
                Err(SbootError::DRIVER_DEVICE_READ_OUT_OF_BOUNDS)?;
            }
        }

        let start =
            usize::try_from(src_offset).map_err(|_| SbootError::DRIVER_DEVICE_READ_OUT_OF_BOUNDS)?;
        let end = start
            .checked_add(dst.len())
            .ok_or(SbootError::DRIVER_DEVICE_READ_OUT_OF_BOUNDS)?;
        let src = self
            .image
            .get(start..end)
            .ok_or(SbootError::DRIVER_DEVICE_READ_OUT_OF_BOUNDS)?;
        dst.copy_from_slice(src);
        self.reads += 1;

        if let Some(tamper) = self.tamper {
            if (start as u64..end as u64).contains(&tamper.offset) {
                self.image[tamper.offset as usize] ^= tamper.mask;
                self.tamper = None;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_bounds() {
        let mut device = BootDevice::new(vec![1, 2, 3, 4]);
        let mut buf = [0u8; 2];
        device.copy(2, &mut buf).unwrap();
        assert_eq!(buf, [3, 4]);
        assert_eq!(
            device.copy(3, &mut buf),
            Err(SbootError::DRIVER_DEVICE_READ_OUT_OF_BOUNDS)
        );
    }

    #[test]
    fn test_tamper_after_first_read() {
        let mut device = BootDevice::new(vec![0u8; 8]);
        device.set_tamper(Tamper {
            offset: 5,
            mask: 0xFF,
        });
        let mut buf = [0u8; 4];
        device.copy(0, &mut buf).unwrap();
        assert_eq!(device.image()[5], 0);

        device.copy(4, &mut buf).unwrap();
        assert_eq!(buf, [0, 0, 0, 0]);
        device.copy(4, &mut buf).unwrap();
        assert_eq!(buf, [0, 0xFF, 0, 0]);
    }
}
