//! # Skirmish
//!
//! Headless harness for the Skirmish combat core.
//!
//! Runs a scripted encounter at a variable frame rate with fixed-rate
//! movement steps and prints a JSON summary on stdout. Logs go to stderr.
//!
//! Usage: `skirmish [CONFIG.toml] [--write-config PATH]`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod config;
mod scenario;
mod timing;

use anyhow::{bail, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::SimConfig;
use crate::scenario::Encounter;

/// Command-line options.
#[derive(Debug, Default)]
struct Options {
    config_path: Option<String>,
    write_config: Option<String>,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Options> {
    let mut options = Options::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--write-config" => match args.next() {
                Some(path) => options.write_config = Some(path),
                None => bail!("--write-config needs a path"),
            },
            flag if flag.starts_with("--") => bail!("unknown option: {flag}"),
            _ if options.config_path.is_none() => options.config_path = Some(arg),
            _ => bail!("unexpected argument: {arg}"),
        }
    }
    Ok(options)
}

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("skirmish=info".parse()?)
                .add_directive("skirmish_combat=info".parse()?),
        )
        .init();

    info!("Skirmish starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let options = parse_args(std::env::args().skip(1))?;
    let mut config = options
        .config_path
        .as_deref()
        .map_or_else(SimConfig::default, SimConfig::load_from);
    config.validate();

    if let Some(path) = options.write_config.as_deref() {
        config.save_to(path)?;
    }

    let encounter = Encounter::new(config);
    info!(
        "Player {:?} among {} actors",
        encounter.player(),
        encounter.world().actor_count()
    );

    let summary = encounter.run()?;
    println!("{}", summary.to_json()?);

    info!("Skirmish shutdown complete");
    Ok(())
}
