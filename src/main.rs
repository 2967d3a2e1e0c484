//! `paypro` command-line client.
//!
//! Talks to a merchant over the JSON payment protocol (version 2) and prints each
//! response after checking its digest and signature against the configured
//! trusted keys.
//!
//! Commands:
//! - `paypro options <URL>` – Accepted chains and currencies, with human amounts
//! - `paypro select <URL> --chain C --currency C` – Payment instructions
//! - `paypro verify <URL> --chain C --currency C --tx HEX[:SIZE]...` – Check unsigned transactions
//! - `paypro pay <URL> --chain C --currency C --tx HEX[:SIZE]...` – Submit signed transactions
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `PAYPRO_CONFIG` points at the JSON configuration file
//! - `RUST_LOG` controls log verbosity on stderr
//! - `OTEL_*` variables enable span export over OTLP

mod config;
mod run;
mod telemetry;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        println!("{e}");
        process::exit(1)
    }
}
