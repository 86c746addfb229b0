/*++

Licensed under the Apache-2.0 license.

File Name:

    pmu.rs

Abstract:

    File contains the emulated platform management unit handshake.

--*/

#[derive(Default)]
pub struct Pmu {
    sleep_requested: bool,
    sleeping: bool,
    wake_requested: bool,
    fw_present: bool,
    countdown: u32,

    /// Polls before the PMU reports sleeping or firmware present
    pub latency: u32,

    /// The PMU never answers
    pub unresponsive: bool,

    /// Firmware is executing; otherwise the PMU ROM idles asleep
    pub fw_running: bool,

    pub ipis: usize,
    pub wakes: usize,

    /// Number of sleep status reads
    pub sleep_polls: usize,
}

impl Pmu {
    /// Running PMU firmware answering after `polls` polls
    pub fn with_latency(polls: u32) -> Self {
        Self {
            latency: polls,
            fw_running: true,
            ..Default::default()
        }
    }

    /// Running PMU firmware that never answers
    pub fn with_no_response() -> Self {
        Self {
            unresponsive: true,
            fw_running: true,
            ..Default::default()
        }
    }

    pub fn trigger_ipi(&mut self) {
        self.ipis += 1;
        self.sleep_requested = true;
        self.countdown = self.latency;
    }

    pub fn sleeping(&mut self) -> bool {
        self.sleep_polls += 1;
        if !self.fw_running {
            return true;
        }
        if self.sleep_requested && !self.unresponsive && self.tick() {
            self.sleeping = true;
            self.sleep_requested = false;
        }
        self.sleeping
    }

    pub fn wake(&mut self) {
        self.wakes += 1;
        self.sleeping = false;
        self.wake_requested = true;
        self.countdown = self.latency;
    }

    pub fn fw_present(&mut self) -> bool {
        if self.wake_requested && !self.unresponsive && self.tick() {
            self.fw_present = true;
            self.fw_running = true;
            self.wake_requested = false;
        }
        self.fw_present
    }

    fn tick(&mut self) -> bool {
        if self.countdown == 0 {
            return true;
        }
        self.countdown -= 1;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake() {
        let mut pmu = Pmu::with_latency(1);
        assert!(!pmu.sleeping());
        pmu.trigger_ipi();
        assert!(!pmu.sleeping());
        assert!(pmu.sleeping());
        pmu.wake();
        assert!(!pmu.fw_present());
        assert!(pmu.fw_present());
    }

    #[test]
    fn test_unresponsive() {
        let mut pmu = Pmu::with_no_response();
        pmu.trigger_ipi();
        assert!(!(0..10).any(|_| pmu.sleeping()));
    }

    #[test]
    fn test_idle_rom_sleeps() {
        let mut pmu = Pmu::default();
        assert!(pmu.sleeping());
        assert_eq!(pmu.ipis, 0);
        pmu.wake();
        assert!(pmu.fw_present());
        assert!(!pmu.sleeping());
        assert_eq!(pmu.sleep_polls, 2);
    }
}
