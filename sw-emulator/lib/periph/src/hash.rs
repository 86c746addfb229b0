/*++

Licensed under the Apache-2.0 license.

File Name:

    hash.rs

Abstract:

    File contains the emulated SHA3/SHA2 engine.

--*/

use sboot_drivers::HashEngine;
use sboot_emu_crypto::{DigestMode, RunningDigest};
use sboot_error::{SbootError, SbootResult};
use sboot_image_types::{Digest, HashAlgorithm};

#[derive(Default)]
pub struct EmuHash {
    state: Option<RunningDigest>,

    /// Number of digest operations started
    pub starts: usize,

    /// Bytes absorbed over the lifetime of the engine
    pub bytes_absorbed: u64,
}

impl EmuHash {
    fn to_digest(bytes: Vec<u8>) -> SbootResult<Digest> {
        Digest::from_slice(&bytes).ok_or(SbootError::DRIVER_HASH_INVALID_STATE)
    }
}

impl HashEngine for EmuHash {
    fn start(&mut self, alg: HashAlgorithm) -> SbootResult<()> {
        let mode = match alg {
            HashAlgorithm::Sha3_384 => DigestMode::Sha3_384,
            HashAlgorithm::Sha2_256 => DigestMode::Sha2_256,
        };
        self.state = Some(RunningDigest::new(mode));
        self.starts += 1;
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> SbootResult<()> {
        let state = self
            .state
            .as_mut()
            .ok_or(SbootError::DRIVER_HASH_INVALID_STATE)?;
        state.update(data);
        self.bytes_absorbed += data.len() as u64;
        Ok(())
    }

    fn running_digest(&mut self) -> SbootResult<Digest> {
        let state = self
            .state
            .as_ref()
            .ok_or(SbootError::DRIVER_HASH_INVALID_STATE)?;
        Self::to_digest(state.snapshot())
    }

    fn finish(&mut self) -> SbootResult<Digest> {
        let state = self
            .state
            .take()
            .ok_or(SbootError::DRIVER_HASH_INVALID_STATE)?;
        Self::to_digest(state.finalize())
    }
}
