/*++

Licensed under the Apache-2.0 license.

File Name:

    digest.rs

Abstract:

    File contains SHA3-384 and SHA2-256 with running digest support

--*/

use sha2::Sha256;
use sha3::{Digest, Sha3_384};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DigestMode {
    Sha3_384,
    Sha2_256,
}

#[derive(Clone)]
enum Hasher {
    Sha3(Sha3_384),
    Sha2(Sha256),
}

/// Multi step digest whose intermediate value can be read without ending it
#[derive(Clone)]
pub struct RunningDigest {
    hasher: Hasher,
}

impl RunningDigest {
    pub fn new(mode: DigestMode) -> Self {
        let hasher = match mode {
            DigestMode::Sha3_384 => Hasher::Sha3(Sha3_384::new()),
            DigestMode::Sha2_256 => Hasher::Sha2(Sha256::new()),
        };
        Self { hasher }
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.hasher {
            Hasher::Sha3(h) => h.update(data),
            Hasher::Sha2(h) => h.update(data),
        }
    }

    /// Digest of the data absorbed so far
    pub fn snapshot(&self) -> Vec<u8> {
        self.clone().finalize()
    }

    pub fn finalize(self) -> Vec<u8> {
        match self.hasher {
            Hasher::Sha3(h) => h.finalize().to_vec(),
            Hasher::Sha2(h) => h.finalize().to_vec(),
        }
    }
}
