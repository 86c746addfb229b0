/*++

Licensed under the Apache-2.0 license.

File Name:

    sink.rs

Abstract:

    File contains the API of partition destinations: addressable memory and
    the programmable logic configuration port.

--*/

use sboot_error::SbootResult;

pub trait DestinationSink {
    /// Mutable view of `len` bytes of destination memory at `addr`
    fn region(&mut self, addr: u64, len: usize) -> SbootResult<&mut [u8]>;

    /// Write `data` to destination memory at `addr`
    fn write(&mut self, addr: u64, data: &[u8]) -> SbootResult<()> {
        self.region(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// Start a transfer of `data` to the configuration port
    fn push_to_bitstream_fabric(&mut self, data: &[u8]) -> SbootResult<()>;

    /// Poll the completion of the last transfer
    fn fabric_transfer_done(&mut self) -> bool;

    /// Poll the configuration done signal of the programmable logic
    fn fabric_config_done(&mut self) -> bool;

    /// Return the programmable logic to the unconfigured state
    fn reset_fabric(&mut self);
}
