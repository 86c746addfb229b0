/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    Partition header validation, chain of trust and checksum verification.

--*/
#![cfg_attr(not(feature = "std"), no_std)]

pub mod chain;
pub mod checksum;
pub mod header;

pub use chain::{absorb_signed_cert, Authenticated, ChainOfTrustVerifier, SpkVerified};
pub use checksum::ChecksumVerifier;
pub use header::{
    validate, validate_boot_header, BootHeaderInfo, ExecState, HeaderCheck, PartitionInfo,
    PartitionSecurity, SkipReason,
};
