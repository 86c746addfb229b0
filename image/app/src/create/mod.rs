/*++

Licensed under the Apache-2.0 license.

File Name:

   mod.rs

Abstract:

    File contains implementation of the boot image creation command.

--*/

mod config;

use anyhow::Context;
use clap::ArgMatches;
use sboot_image_crypto::{rsa_priv_key_from_pem_file, RustCrypto};
use sboot_image_gen::*;
use std::path::{Path, PathBuf};

use config::{
    load_image_config, parse_cpu, parse_device, parse_hash, parse_hex, parse_owner, ImageConfig,
    KeyConfig, PartitionConfig,
};

/// Run the command
pub(crate) fn run_cmd(args: &ArgMatches) -> anyhow::Result<()> {
    let config_path: &PathBuf = args
        .get_one::<PathBuf>("config")
        .with_context(|| "config arg not specified")?;

    let out_path: &PathBuf = args
        .get_one::<PathBuf>("out")
        .with_context(|| "out arg not specified")?;

    let config = load_image_config(config_path)?;
    let base = config_path.parent().unwrap_or(Path::new("."));
    let gen_config = generator_config(&config, base)?;

    let generator = ImageGenerator::new(RustCrypto::default());
    let image = generator.generate(&gen_config, &mut rand::thread_rng())?;

    std::fs::write(out_path, &image)
        .with_context(|| format!("Failed to write image {}", out_path.display()))?;
    println!(
        "Wrote {} partitions, {} bytes to {}",
        gen_config.partitions.len(),
        image.len(),
        out_path.display()
    );
    Ok(())
}

/// Print the PPK digest of the configured keys
pub(crate) fn run_ppk_digest_cmd(args: &ArgMatches) -> anyhow::Result<()> {
    let config_path: &PathBuf = args
        .get_one::<PathBuf>("config")
        .with_context(|| "config arg not specified")?;

    let config = load_image_config(config_path)?;
    let base = config_path.parent().unwrap_or(Path::new("."));
    let key_config = config
        .keys
        .as_ref()
        .with_context(|| "keys section not specified")?;
    let keys = load_keys(key_config, base)?;

    let generator = ImageGenerator::new(RustCrypto::default());
    let digest = generator.ppk_digest(&keys)?;
    println!("{}", hex::encode(digest.as_bytes()));
    Ok(())
}

fn generator_config(config: &ImageConfig, base: &Path) -> anyhow::Result<ImageGeneratorConfig> {
    let keys = match &config.keys {
        Some(keys) => Some(load_keys(keys, base)?),
        None => None,
    };
    let device_key = match &config.device_key {
        Some(key) => Some(parse_hex("device_key", key)?),
        None => None,
    };

    let partitions = config
        .partitions
        .iter()
        .enumerate()
        .map(|(index, partition)| {
            generator_partition(partition, base).with_context(|| format!("Partition {index}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(ImageGeneratorConfig {
        hash_alg: parse_hash(config.hash.as_deref())?,
        boot_iv: parse_hex("boot_iv", &config.boot_iv)?,
        device_key,
        keys,
        partitions,
    })
}

fn generator_partition(
    config: &PartitionConfig,
    base: &Path,
) -> anyhow::Result<ImageGeneratorPartition> {
    let payload = match &config.file {
        Some(file) => {
            let path = base.join(file);
            std::fs::read(&path)
                .with_context(|| format!("Failed to read partition file {}", path.display()))?
        }
        None => Vec::new(),
    };

    Ok(ImageGeneratorPartition {
        payload,
        dest_cpu: parse_cpu(&config.dest_cpu)?,
        dest_device: parse_device(&config.dest_device)?,
        owner: parse_owner(&config.owner)?,
        aarch32: config.aarch32,
        load_addr: config.load_addr,
        exec_addr: config.exec_addr,
        checksum: config.checksum,
        authenticate: config.authenticate,
        encrypt: config.encrypt,
        key_roll_block_len: config.key_roll_block_len,
        block_size_code: config.block_size_code,
        iv_fragment: config.iv_fragment,
        execute_in_place: config.execute_in_place,
    })
}

fn load_keys(config: &KeyConfig, base: &Path) -> anyhow::Result<ImageGeneratorKeys> {
    Ok(ImageGeneratorKeys {
        ppk: rsa_priv_key_from_pem_file(&base.join(&config.ppk))?,
        spk: rsa_priv_key_from_pem_file(&base.join(&config.spk))?,
        spk_id: config.spk_id,
    })
}
