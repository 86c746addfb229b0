/*++

Licensed under the Apache-2.0 license.

File Name:

   config.rs

Abstract:

    File contains utilities for parsing configuration files

--*/

use anyhow::{bail, Context};
use sboot_image_types::*;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

/// Signing key configuration
#[derive(Default, Serialize, Deserialize)]
pub(crate) struct KeyConfig {
    /// PKCS#8 PEM of the primary key
    pub ppk: String,

    /// PKCS#8 PEM of the secondary key
    pub spk: String,

    #[serde(default)]
    pub spk_id: u32,
}

/// Partition configuration
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PartitionConfig {
    /// Payload binary, empty for execute in place partitions
    pub file: Option<String>,

    pub dest_cpu: String,

    pub dest_device: String,

    pub owner: String,

    pub aarch32: bool,

    pub load_addr: u64,

    pub exec_addr: u64,

    pub checksum: bool,

    pub authenticate: bool,

    pub encrypt: bool,

    pub key_roll_block_len: usize,

    pub block_size_code: u8,

    pub iv_fragment: u8,

    pub execute_in_place: bool,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            file: None,
            dest_cpu: "a53-0".into(),
            dest_device: "ps".into(),
            owner: "fsbl".into(),
            aarch32: false,
            load_addr: 0,
            exec_addr: 0,
            checksum: false,
            authenticate: false,
            encrypt: false,
            key_roll_block_len: 0,
            block_size_code: 0,
            iv_fragment: 0,
            execute_in_place: false,
        }
    }
}

/// Image configuration
#[derive(Default, Serialize, Deserialize)]
pub(crate) struct ImageConfig {
    /// "sha3-384" or "sha2-256"
    #[serde(default)]
    pub hash: Option<String>,

    /// Hex encoded boot IV
    pub boot_iv: String,

    /// Hex encoded device key
    pub device_key: Option<String>,

    pub keys: Option<KeyConfig>,

    #[serde(default)]
    pub partitions: Vec<PartitionConfig>,
}

/// Load image configuration from file
pub(crate) fn load_image_config(path: &Path) -> anyhow::Result<ImageConfig> {
    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read the config file {}", path.display()))?;

    let config: ImageConfig = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    Ok(config)
}

pub(crate) fn parse_hash(name: Option<&str>) -> anyhow::Result<HashAlgorithm> {
    Ok(match name {
        None | Some("sha3-384") => HashAlgorithm::Sha3_384,
        Some("sha2-256") => HashAlgorithm::Sha2_256,
        Some(other) => bail!("Unknown hash algorithm {other}"),
    })
}

pub(crate) fn parse_cpu(name: &str) -> anyhow::Result<DestinationCpu> {
    Ok(match name {
        "none" => DestinationCpu::None,
        "a53-0" => DestinationCpu::A53_0,
        "a53-1" => DestinationCpu::A53_1,
        "a53-2" => DestinationCpu::A53_2,
        "a53-3" => DestinationCpu::A53_3,
        "r5-0" => DestinationCpu::R5_0,
        "r5-1" => DestinationCpu::R5_1,
        "r5-lockstep" => DestinationCpu::R5Lockstep,
        "pmu" => DestinationCpu::Pmu,
        other => bail!("Unknown destination CPU {other}"),
    })
}

pub(crate) fn parse_device(name: &str) -> anyhow::Result<DestinationDevice> {
    Ok(match name {
        "none" => DestinationDevice::None,
        "ps" => DestinationDevice::Ps,
        "pl" => DestinationDevice::Pl,
        other => bail!("Unknown destination device {other}"),
    })
}

pub(crate) fn parse_owner(name: &str) -> anyhow::Result<PartitionOwner> {
    Ok(match name {
        "fsbl" => PartitionOwner::Fsbl,
        "u-boot" => PartitionOwner::UBoot,
        other => bail!("Unknown partition owner {other}"),
    })
}

/// Decode a hex string into a fixed size array
pub(crate) fn parse_hex<const N: usize>(name: &str, value: &str) -> anyhow::Result<[u8; N]> {
    let bytes = hex::decode(value).with_context(|| format!("{name} is not valid hex"))?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow::anyhow!("{name} must be {N} bytes, got {}", bytes.len()))
}
