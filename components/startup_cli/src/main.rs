//! Startup program inspector
//!
//! Entry point for the inspector. Parses CLI arguments and delegates to the
//! Inspector for loading and rendering.

use clap::Parser;
use startup_cli::{Cli, Inspector};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rendered = Inspector::load(&cli.file).and_then(|inspector| inspector.render(&cli));
    match rendered {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
