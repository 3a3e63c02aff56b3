mod bot;
mod cli;
mod config;
mod correction;
mod engine;
mod gateway;
mod identity;
mod model;
mod storage;
mod store;
#[cfg(test)]
mod testing;
mod transport;

use std::process;

use tracing_subscriber::EnvFilter;

use config::Config;
use storage::Storage;

fn main() {
    // Logs go to stderr; stdout belongs to the console transport.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let root = config
        .data_dir
        .clone()
        .or_else(Storage::default_root)
        .unwrap_or_else(|| {
            eprintln!("Could not determine home directory.");
            process::exit(1);
        });

    let storage = match Storage::new(root, config.public_base_url.clone()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialize storage: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&config, storage) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
