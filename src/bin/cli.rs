//! atlasrec CLI
//!
//! Maintenance tool for inspecting and compacting a store on disk.

use std::path::PathBuf;
use std::process;

use atlasrec::{Config, Engine, Key, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// atlasrec CLI
#[derive(Parser, Debug)]
#[command(name = "atlasrec-cli")]
#[command(about = "Inspect and maintain an atlasrec store")]
#[command(version)]
struct Args {
    /// Directory holding index.dat, data.dat and cache.json
    #[arg(short, long, default_value = "./atlasrec_data")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty store (replaces existing files)
    Create {
        /// Data file reservation in 4 KiB pages
        #[arg(short, long, default_value = "256")]
        pages: u16,
    },

    /// Show header fields and slot counts per state
    Stat,

    /// Print the payload stored under a key
    Get {
        /// The key to fetch
        key: u32,
    },

    /// Delete a key
    Delete {
        /// The key to delete
        key: u32,
    },

    /// List every index slot
    Dump,

    /// Rewrite live records into fresh files
    Compress,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,atlasrec=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::Create { pages } => {
            std::fs::create_dir_all(&args.dir)?;
            let config = Config::builder()
                .data_dir(&args.dir)
                .data_page_count(pages)
                .build();
            Engine::create(&config)
        }
        Commands::Stat => {
            let engine = Engine::open(Config::in_dir(&args.dir))?;
            let stats = engine.stats()?;
            println!("last key:   {}", stats.last_key);
            println!("index:      {} / {} bytes", stats.index_used, stats.index_capacity);
            println!("data:       {} / {} bytes", stats.data_used, stats.data_capacity);
            println!("slots:      {}", stats.slots);
            println!("  live:     {} (ok {}, tail {})", stats.live(), stats.ok, stats.tail);
            println!("  links:    {} (head {}, linked {})", stats.head + stats.linked, stats.head, stats.linked);
            println!("  deleted:  {}", stats.deleted);
            println!("  copied:   {}", stats.copied);
            engine.close()
        }
        Commands::Get { key } => {
            let mut engine = Engine::open(Config::in_dir(&args.dir))?;
            match engine.fetch_raw(Key::new(key))? {
                Some(stored) => {
                    println!("{} ({})", stored.key, stored.type_tag);
                    println!("{}", String::from_utf8_lossy(&stored.payload));
                }
                None => println!("(not found)"),
            }
            engine.close()
        }
        Commands::Delete { key } => {
            let mut engine = Engine::open(Config::in_dir(&args.dir))?;
            engine.delete(Key::new(key))?;
            engine.close()
        }
        Commands::Dump => {
            let engine = Engine::open(Config::in_dir(&args.dir))?;
            for (offset, record) in engine.index_records()? {
                println!(
                    "{:>10}  {:<7}  key={:<10} offset={:<10} length={:<10} {}",
                    offset, record.state, record.key, record.offset, record.length, record.type_tag
                );
            }
            engine.close()
        }
        Commands::Compress => {
            let mut engine = Engine::open(Config::in_dir(&args.dir))?;
            let stats = engine.compress()?;
            println!(
                "copied {} of {} slots, reclaimed {} bytes",
                stats.records_copied,
                stats.slots_scanned,
                stats.bytes_reclaimed()
            );
            engine.close()
        }
    }
}
