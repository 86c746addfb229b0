/*++

Licensed under the Apache-2.0 license.

File Name:

    hand_off.rs

Abstract:

    Table of CPU entry points collected while loading partitions.

--*/

use sboot_drivers::cprintln;
use sboot_image_types::DestinationCpu;
use sboot_image_verify::ExecState;

pub const MAX_HANDOFF_ENTRIES: usize = 8;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct HandoffEntry {
    pub cpu: DestinationCpu,
    pub exec_state: ExecState,
    pub entry_address: u64,
}

/// Entry points, at most one per CPU
#[derive(Debug, Copy, Clone, Default)]
pub struct HandoffTable {
    entries: [Option<HandoffEntry>; MAX_HANDOFF_ENTRIES],
    count: usize,
}

impl HandoffTable {
    /// Record `entry` unless its CPU already has one
    ///
    /// # Returns
    ///
    /// * `bool` - true if the entry was recorded
    pub fn record(&mut self, entry: HandoffEntry) -> bool {
        if self.get(entry.cpu).is_some() {
            cprintln!("[ldr] Handoff for CPU {} already recorded", entry.cpu as u8);
            return false;
        }
        match self.entries.get_mut(self.count) {
            Some(slot) => {
                *slot = Some(entry);
                self.count += 1;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, cpu: DestinationCpu) -> Option<&HandoffEntry> {
        self.iter().find(|e| e.cpu == cpu)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HandoffEntry> {
        self.entries.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
