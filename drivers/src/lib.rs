/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the boot loader driver interfaces.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

mod aes;
mod boot_device;
mod hash;
pub mod printer;
mod platform;
mod rsa;
mod sink;
pub mod wait;

pub use aes::{CipherEngine, KeySource};
pub use boot_device::DeviceCopy;
pub use hash::HashEngine;
pub use platform::{MemoryDomains, Platform};
pub use printer::HexBytes;
pub use rsa::SignatureEngine;
pub use sboot_error::{SbootError, SbootResult};
pub use sink::DestinationSink;
