/*++

Licensed under the Apache-2.0 license.

File Name:

    fabric.rs

Abstract:

    File contains the emulated PL configuration port.

--*/

use sboot_error::{SbootError, SbootResult};

#[derive(Default)]
pub struct Fabric {
    received: Vec<u8>,
    pending_polls: u32,
    busy: bool,

    /// Polls reporting busy after each transfer
    pub transfer_latency: u32,

    /// Transfers never complete
    pub transfer_stuck: bool,

    /// Configuration done is never signalled
    pub done_stuck: bool,

    /// Number of transfers started
    pub pushes: usize,

    /// Number of resets
    pub resets: usize,
}

impl Fabric {
    /// Fabric reporting busy for `polls` polls after each transfer
    pub fn with_transfer_latency(polls: u32) -> Self {
        Self {
            transfer_latency: polls,
            ..Default::default()
        }
    }

    /// Fabric whose transfers never complete
    pub fn with_stuck_transfer() -> Self {
        Self {
            transfer_stuck: true,
            ..Default::default()
        }
    }

    /// Fabric that never signals configuration done
    pub fn with_stuck_done() -> Self {
        Self {
            done_stuck: true,
            ..Default::default()
        }
    }

    /// Bitstream bytes received since the last reset
    pub fn received(&self) -> &[u8] {
        &self.received
    }

    pub fn push(&mut self, data: &[u8]) -> SbootResult<()> {
        if self.busy {
            Err(SbootError::DRIVER_FABRIC_NOT_READY)?;
        }
        self.received.extend_from_slice(data);
        self.pending_polls = self.transfer_latency;
        self.busy = true;
        self.pushes += 1;
        Ok(())
    }

    pub fn transfer_done(&mut self) -> bool {
        if self.transfer_stuck {
            return false;
        }
        if self.pending_polls > 0 {
            self.pending_polls -= 1;
            return false;
        }
        self.busy = false;
        true
    }

    pub fn config_done(&mut self) -> bool {
        !self.done_stuck && !self.busy && !self.received.is_empty()
    }

    pub fn reset(&mut self) {
        self.received.clear();
        self.pending_polls = 0;
        self.busy = false;
        self.resets += 1;
    }
}
