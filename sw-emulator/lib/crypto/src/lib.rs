/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the boot loader emulator crypto library.

--*/

mod aes256ctr;
mod aes256gcm;
mod digest;
mod rsa;

pub use aes256ctr::Aes256Ctr32;
pub use aes256gcm::{Aes256Gcm, Aes256GcmStream};
pub use digest::{DigestMode, RunningDigest};
pub use rsa::RsaPublicOp;

pub const AES_256_BLOCK_SIZE: usize = 16;
pub const AES_256_KEY_SIZE: usize = 32;
pub const AES_256_GCM_IV_SIZE: usize = 12;
pub const AES_256_GCM_TAG_SIZE: usize = 16;
pub const RSA_4096_BYTE_SIZE: usize = 512;
