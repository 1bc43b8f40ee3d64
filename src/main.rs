use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use albumfix::catalog::{CachedCatalog, LastfmCatalog};
use albumfix::discover::IGNORE_LIST_FILE;
use albumfix::progress;
use albumfix::reconcile::{run, ConsoleConfirm, LocalFs, RunOptions};
use albumfix::store::{SqliteStore, CACHE_STORE_FILE, STATUS_STORE_FILE};

#[derive(Parser)]
#[command(name = "albumfix", version)]
#[command(about = "Reconcile local album directories against catalog metadata")]
struct Args {
    /// Start scanning from this directory
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Plan without deleting leftover files
    #[arg(long)]
    no_delete: bool,

    /// Also process albums already recorded as finished
    #[arg(long)]
    force: bool,

    /// Hide progress spinners (tail-friendly output)
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    progress::set_log_only(args.log_only);

    let catalog = LastfmCatalog::from_env().context("catalog configuration")?;
    let cache = SqliteStore::open(Path::new(CACHE_STORE_FILE))?;
    let catalog = CachedCatalog::new(catalog, cache);
    let status = SqliteStore::open(Path::new(STATUS_STORE_FILE))?;

    let opts = RunOptions {
        base_dir: args.dir,
        delete: !args.no_delete,
        force: args.force,
        ignore_file: PathBuf::from(IGNORE_LIST_FILE),
    };
    run(&opts, &catalog, &status, &mut ConsoleConfirm, &mut LocalFs::new())
}
