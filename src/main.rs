use std::process;

use clap::Parser;
use tracing::Level;

use rbscan::cli::Args;

fn main() {
    let args = Args::parse();

    let level = if args.debug { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match rbscan::run(args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            tracing::error!("{e:#}");
            process::exit(3);
        }
    }
}
