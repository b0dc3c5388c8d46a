//! cqlmigrate Command-Line Client
//!
//! Reports and validates the migration state of a Cassandra keyspace.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod commands;
mod config;
mod formatter;

use clap::Parser;
use config::{Args, Command};
use cqlmigrate_core::{FileSystemResolver, SledHistoryStore};
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cqlmigrate=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.to_config()?;
    let formatter = formatter::create_formatter(args.format);

    let db = sled::open(&args.data_path)?;
    let store = SledHistoryStore::open(&db, &config.keyspace, &config.table)?;
    let resolver = FileSystemResolver::new(&args.location);

    match args.command {
        Command::Info => {
            let output = commands::info(&resolver, &store, &config, &*formatter)?;
            println!("{}", output);
        }
        Command::Validate => match commands::validate(&resolver, &store, &config, &*formatter) {
            Ok(output) => println!("{}", output),
            Err((rendered, e)) => {
                if !rendered.is_empty() {
                    println!("{}", rendered);
                }
                return Err(e.into());
            }
        },
        Command::Baseline => {
            let output = commands::baseline(&store, &config, &args.user, &*formatter)?;
            println!("{}", output);
        }
    }

    Ok(())
}
