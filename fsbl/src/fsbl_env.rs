/*++

Licensed under the Apache-2.0 license.

File Name:

    fsbl_env.rs

Abstract:

    Engines and working memory used by the partition loader.

--*/

use sboot_drivers::{
    CipherEngine, DestinationSink, DeviceCopy, HashEngine, Platform, SignatureEngine,
};

/// Loader Environment
pub struct LoaderEnv<'a> {
    /// Hash engine
    pub hash: &'a mut dyn HashEngine,

    /// RSA engine
    pub rsa: &'a mut dyn SignatureEngine,

    /// AES-GCM engine
    pub cipher: &'a mut dyn CipherEngine,

    /// Boot device holding the image
    pub device: &'a mut dyn DeviceCopy,

    /// Memory and PL configuration port
    pub sink: &'a mut dyn DestinationSink,

    pub platform: &'a mut dyn Platform,

    /// Staging buffer, at least the configured chunk size
    pub chunk_buf: &'a mut [u8],

    /// Committed chunk digests of the block being authenticated
    pub hash_store: &'a mut [u8],
}
