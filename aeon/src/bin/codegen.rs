//! Instrument table generator binary.
//!
//! Reads the instrument capability document of an observation portal and
//! prints the matching `instrument_registry!` table.
//!
//! # Usage
//!
//! ```bash
//! curl -s https://observe.lco.global/api/instruments/ > instruments.json
//! cargo run --bin aeon-codegen --features codegen -- instruments.json
//!
//! # or from stdin
//! curl -s https://observe.lco.global/api/instruments/ | cargo run --bin aeon-codegen --features codegen
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (default: info). Logs go to stderr.

use std::env;
use std::fs;
use std::io::{self, Read, Write};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    let input = match env::args_os().nth(1) {
        Some(path) => {
            info!("Reading instrument document from {}", path.to_string_lossy());
            fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.to_string_lossy()))?
        }
        None => {
            info!("Reading instrument document from stdin");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };

    let table = aeon::codegen::generate_instrument_table(&input)?;
    io::stdout()
        .write_all(table.as_bytes())
        .context("failed to write table")?;
    info!("Instrument table written");
    Ok(())
}
