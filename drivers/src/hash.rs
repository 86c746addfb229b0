/*++

Licensed under the Apache-2.0 license.

File Name:

    hash.rs

Abstract:

    File contains the API of the hash engine used for checksums and signatures.

--*/

use sboot_error::SbootResult;
use sboot_image_types::{Digest, HashAlgorithm};

/// Multi step hash engine
///
/// A digest operation is `start`, any number of `update` calls and `finish`.
/// `running_digest` returns the digest of everything absorbed so far without
/// ending the operation.
pub trait HashEngine {
    /// Initialize a multi step digest operation
    fn start(&mut self, alg: HashAlgorithm) -> SbootResult<()>;

    /// Absorb `data`
    fn update(&mut self, data: &[u8]) -> SbootResult<()>;

    /// Snapshot of the digest so far; the operation continues
    fn running_digest(&mut self) -> SbootResult<Digest>;

    /// Finalize the digest operation
    fn finish(&mut self) -> SbootResult<Digest>;

    /// Calculate the digest of `data` in one step
    fn digest(&mut self, alg: HashAlgorithm, data: &[u8]) -> SbootResult<Digest> {
        self.start(alg)?;
        self.update(data)?;
        self.finish()
    }
}
