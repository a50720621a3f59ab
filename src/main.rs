// Entrypoint for the `pinry` binary.
// - Keeps `main` small: set up logging, parse arguments, run the command.
// - Errors are printed to stderr and the process exits with status 1.

use clap::Parser;
use pinry_cli::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

fn main() {
    // WARN by default, RUST_LOG overrides.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
