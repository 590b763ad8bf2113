//! Tessera CLI

use clap::{Arg, Command};
use std::{io::Write, path::PathBuf};
use tessera_square::Config;
use tracing::{error, Level};

mod commands;

/// Returns the version of the crate.
pub const fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Flag for the maximum log level
const LOG_LEVEL_FLAG: &str = "log-level";

/// Flag for the application version
const APP_VERSION_FLAG: &str = "app-version";

fn block_arg() -> Arg {
    Arg::new("block")
        .long("block")
        .required(true)
        .help("Path to a protobuf encoded block")
        .value_parser(clap::value_parser!(PathBuf))
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .help("Path to write the protobuf encoded proof to (stdout if omitted)")
        .value_parser(clap::value_parser!(PathBuf))
}

/// Write an encoded proof to `output`, or stdout if `None`.
fn write_proof(
    proof: Result<Vec<u8>, commands::Error>,
    output: Option<&PathBuf>,
) -> Result<(), commands::Error> {
    let proof = proof?;
    match output {
        Some(path) => std::fs::write(path, proof)?,
        None => std::io::stdout().write_all(&proof)?,
    }
    Ok(())
}

/// Entrypoint for the Tessera CLI
fn main() -> std::process::ExitCode {
    // Define application
    let matches = Command::new("tessera")
        .version(crate_version())
        .about("Compute blob commitments and prove inclusion in data squares.")
        .arg(
            Arg::new(LOG_LEVEL_FLAG)
                .long(LOG_LEVEL_FLAG)
                .global(true)
                .default_value("info")
                .help("Maximum log level")
                .value_parser(clap::value_parser!(Level)),
        )
        .arg(
            Arg::new(APP_VERSION_FLAG)
                .long(APP_VERSION_FLAG)
                .global(true)
                .default_value("3")
                .help("Application version whose parameters apply")
                .value_parser(clap::value_parser!(u64)),
        )
        .subcommand(
            Command::new(commands::COMMIT_CMD)
                .about("Compute the share commitment of a blob.")
                .arg(
                    Arg::new("namespace")
                        .long("namespace")
                        .required(true)
                        .help("Hex encoded 29 byte namespace")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    Arg::new("data")
                        .long("data")
                        .required(true)
                        .help("Path to the blob data")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("share-version")
                        .long("share-version")
                        .default_value("0")
                        .help("Share version of the blob")
                        .value_parser(clap::value_parser!(u8)),
                )
                .arg(
                    Arg::new("signer")
                        .long("signer")
                        .help("Hex encoded 20 byte signer (share version 1 only)")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    Arg::new("threshold")
                        .long("threshold")
                        .help("Subtree root threshold (defaults to the application version's)")
                        .value_parser(clap::builder::RangedU64ValueParser::<usize>::new().range(1..)),
                ),
        )
        .subcommand(
            Command::new(commands::PROVE_CMD)
                .about("Prove that a transaction is included in a block's square.")
                .arg(block_arg())
                .arg(
                    Arg::new("index")
                        .long("index")
                        .required(true)
                        .help("Index of the transaction in the block")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new(commands::PROVE_SHARES_CMD)
                .about("Prove that a range of shares from one namespace is committed to by a block's data root.")
                .arg(block_arg())
                .arg(
                    Arg::new("start")
                        .long("start")
                        .required(true)
                        .help("First share of the range")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("end")
                        .long("end")
                        .required(true)
                        .help("One past the last share of the range")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new(commands::PROVE_BLOB_CMD)
                .about("Prove that a blob is committed to by a block's data root.")
                .arg(block_arg())
                .arg(
                    Arg::new("index")
                        .long("index")
                        .required(true)
                        .help("Index of the blob transaction in the block")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("blob")
                        .long("blob")
                        .default_value("0")
                        .help("Index of the blob within its transaction")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new(commands::DATA_ROOT_CMD)
                .about("Compute the data root of a block.")
                .arg(block_arg()),
        )
        .subcommand(
            Command::new(commands::VERIFY_CMD)
                .about("Verify a transaction inclusion proof.")
                .arg(
                    Arg::new("proof")
                        .long("proof")
                        .required(true)
                        .help("Path to a protobuf encoded proof")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new(commands::VERIFY_SHARES_CMD)
                .about("Verify a share or blob inclusion proof against a data root.")
                .arg(
                    Arg::new("proof")
                        .long("proof")
                        .required(true)
                        .help("Path to a protobuf encoded share proof")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("data-root")
                        .long("data-root")
                        .required(true)
                        .help("Hex encoded 32 byte data root")
                        .value_parser(clap::value_parser!(String)),
                ),
        )
        .get_matches();

    // Create logger
    let level = *matches.get_one::<Level>(LOG_LEVEL_FLAG).unwrap();
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    // Parse subcommands
    let mut config = Config::for_app_version(*matches.get_one::<u64>(APP_VERSION_FLAG).unwrap());
    match matches.subcommand() {
        Some((commands::COMMIT_CMD, matches)) => {
            let namespace = matches.get_one::<String>("namespace").unwrap();
            let data = matches.get_one::<PathBuf>("data").unwrap();
            let share_version = *matches.get_one::<u8>("share-version").unwrap();
            let signer = matches.get_one::<String>("signer").map(|s| s.as_str());
            if let Some(threshold) = matches.get_one::<usize>("threshold") {
                config.subtree_root_threshold = *threshold;
            }
            match commands::commit(namespace, data, share_version, signer, &config) {
                Ok(commitment) => {
                    println!("{commitment}");
                    return std::process::ExitCode::SUCCESS;
                }
                Err(e) => error!(error=?e, "failed to compute commitment"),
            }
        }
        Some((commands::PROVE_CMD, matches)) => {
            let block = matches.get_one::<PathBuf>("block").unwrap();
            let index = *matches.get_one::<usize>("index").unwrap();
            let output = matches.get_one::<PathBuf>("output");
            match write_proof(commands::prove(block, index, &config), output) {
                Ok(()) => return std::process::ExitCode::SUCCESS,
                Err(e) => error!(error=?e, "failed to prove transaction"),
            }
        }
        Some((commands::PROVE_SHARES_CMD, matches)) => {
            let block = matches.get_one::<PathBuf>("block").unwrap();
            let start = *matches.get_one::<usize>("start").unwrap();
            let end = *matches.get_one::<usize>("end").unwrap();
            let output = matches.get_one::<PathBuf>("output");
            match write_proof(commands::prove_shares(block, start, end, &config), output) {
                Ok(()) => return std::process::ExitCode::SUCCESS,
                Err(e) => error!(error=?e, "failed to prove shares"),
            }
        }
        Some((commands::PROVE_BLOB_CMD, matches)) => {
            let block = matches.get_one::<PathBuf>("block").unwrap();
            let index = *matches.get_one::<usize>("index").unwrap();
            let blob = *matches.get_one::<usize>("blob").unwrap();
            let output = matches.get_one::<PathBuf>("output");
            match write_proof(commands::prove_blob(block, index, blob, &config), output) {
                Ok(()) => return std::process::ExitCode::SUCCESS,
                Err(e) => error!(error=?e, "failed to prove blob"),
            }
        }
        Some((commands::DATA_ROOT_CMD, matches)) => {
            let block = matches.get_one::<PathBuf>("block").unwrap();
            match commands::data_root(block, &config) {
                Ok(root) => {
                    println!("{root}");
                    return std::process::ExitCode::SUCCESS;
                }
                Err(e) => error!(error=?e, "failed to compute data root"),
            }
        }
        Some((commands::VERIFY_SHARES_CMD, matches)) => {
            let proof = matches.get_one::<PathBuf>("proof").unwrap();
            let data_root = matches.get_one::<String>("data-root").unwrap();
            match commands::verify_shares(proof, data_root) {
                Ok(()) => return std::process::ExitCode::SUCCESS,
                Err(e) => error!(error=?e, "failed to verify share proof"),
            }
        }
        Some((commands::VERIFY_CMD, matches)) => {
            let proof = matches.get_one::<PathBuf>("proof").unwrap();
            match commands::verify(proof) {
                Ok(()) => return std::process::ExitCode::SUCCESS,
                Err(e) => error!(error=?e, "failed to verify proof"),
            }
        }
        Some((cmd, _)) => {
            error!(cmd, "invalid subcommand");
        }
        None => {
            error!("no subcommand provided");
        }
    }
    std::process::ExitCode::FAILURE
}
