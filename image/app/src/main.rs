/*++

Licensed under the Apache-2.0 license.

File Name:

   main.rs

Abstract:

    Main entry point of the boot image application

--*/
use std::path::PathBuf;

use anyhow::bail;
use clap::{arg, value_parser, Command};

mod create;

/// Entry point
fn main() -> anyhow::Result<()> {
    let sub_cmds = vec![
        Command::new("create")
            .about("Create a new boot image")
            .arg(
                arg!(--"config" <FILE> "Image configuration file")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                arg!(--"out" <FILE> "Output file")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)),
            ),
        Command::new("ppk-digest")
            .about("Print the SHA3-384 digest of the PPK to provision in the device")
            .arg(
                arg!(--"config" <FILE> "Image configuration file")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)),
            ),
    ];

    let cmd = Command::new("sboot-image-app")
        .arg_required_else_help(true)
        .subcommands(sub_cmds)
        .about("Secure boot imaging tools")
        .get_matches();

    match cmd.subcommand() {
        Some(("create", args)) => create::run_cmd(args),
        Some(("ppk-digest", args)) => create::run_ppk_digest_cmd(args),
        _ => bail!("Unknown command"),
    }
}
