//! rootops - command line front end
//!
//! Lists, creates and deletes paths through a privileged shell.

use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};

use rootops::{
    handle_startup_error, load_config, EntryKind, InventoryEntry, PendingDeletions, RootOps,
    SessionManager,
};

/// Privileged filesystem operations through a root shell
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Configuration file (defaults to $ROOTOPS_CONFIG, then the user config dir)
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'd', global = true, default_value_t = false)]
    debug: bool,

    /// Include hidden entries in listings and counts
    #[arg(long, short = 'a', global = true, default_value_t = false)]
    all: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a directory with child counts and sizes
    Ls { path: PathBuf },
    /// Create an empty file
    Touch { path: String },
    /// Create a directory
    Mkdir { path: String },
    /// Delete paths recursively
    Rm {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Show the mount table
    Mounts,
    /// Check whether a root shell is available
    Probe,
}

fn init_logging(debug: bool) {
    let level = if debug { "rootops=debug" } else { "rootops=info" };
    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn print_entries(mut entries: Vec<InventoryEntry>) {
    entries.sort_by(|a, b| a.display_cmp(b));
    for entry in entries {
        println!("{}", entry);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    debug!("Arguments: {:?}", cli);

    let (mut config, source) = match load_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", handle_startup_error(&e));
            process::exit(2);
        }
    };
    if let Some(path) = &source {
        info!("Using configuration {}", path.display());
    }
    if cli.all {
        config.listing.show_hidden = true;
    }

    let ops = RootOps::new(&config);
    let outcome = run(&ops, cli.command).await;

    if let Err(e) = ops.close().await {
        debug!("Closing shell: {}", e);
    }

    match outcome {
        Ok(true) => Ok(()),
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("{}", e);
            match e.downcast_ref::<rootops::Error>() {
                Some(err) => eprintln!("{}", handle_startup_error(err)),
                None => eprintln!("Error: {}", e),
            }
            process::exit(1);
        }
    }
}

async fn run(ops: &RootOps<Arc<SessionManager>>, command: Command) -> Result<bool> {
    match command {
        Command::Ls { path } => {
            print_entries(ops.list(&path).await?);
            Ok(true)
        }
        Command::Touch { path } => Ok(ops.create(&path, EntryKind::File).await?),
        Command::Mkdir { path } => Ok(ops.create(&path, EntryKind::Directory).await?),
        Command::Rm { paths } => {
            let pending: PendingDeletions = paths.iter().collect();
            Ok(ops.delete(&pending).await?)
        }
        Command::Mounts => {
            let table = ops.mount_table().await?;
            for record in table.records() {
                let options: Vec<&str> = record.options.iter().map(String::as_str).collect();
                println!("{} ({})", record.mount_point, options.join(","));
            }
            Ok(true)
        }
        Command::Probe => {
            let is_root = ops.ensure_root().await;
            println!("{}", if is_root { "root" } else { "no root" });
            Ok(is_root)
        }
    }
}
