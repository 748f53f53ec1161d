//! Keystone binary.
//!
//! # Usage
//!
//! ```bash
//! keystone digest --hash sha256 firmware.bin
//! keystone aes-cbc --encrypt --key 2b7e1516... --iv 00010203... plain.bin cipher.bin
//! keystone ecc-keygen --curve prime256v1
//! ```

use clap::Parser;
use keystone_cli::Command;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keystone cryptographic engine
#[derive(Parser, Debug)]
#[command(name = "keystone")]
#[command(about = "AES-CBC, digests, HMAC and elliptic-curve operations")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // stdout carries results
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let stdout = std::io::stdout();
    keystone_cli::run(args.command, &mut stdout.lock())
}
