//! Per-album reconciliation pipeline and run loop.
//!
//! One album flows classify -> match -> plan -> confirm -> apply; the loop
//! drives that pipeline over every discovered album and records the outcome
//! in the status store. A failing album never aborts the run.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::classify::list_album_dir;
use crate::discover::{discover_albums, load_ignore_list, AlbumDir};
use crate::matcher::{match_album_art, match_tracks};
use crate::models::{AlbumMetadata, AlbumStatus};
use crate::plan::{build_plan, Operation, Plan};
use crate::progress::create_spinner;
use crate::store::KeyValueStore;

// ============================================================================
// Collaborators
// ============================================================================

/// Reviewer's decision on a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    AlreadyDone,
    Cancelled,
    Approved,
}

/// Presentation-layer confirmation of a computed plan.
pub trait Confirm {
    fn review(&mut self, metadata: &AlbumMetadata, plan: &Plan) -> Result<Verdict>;
}

/// Interactive console confirmation: renders the plan summary and prompts.
/// A settled plan is reported as already done without prompting.
pub struct ConsoleConfirm;

impl Confirm for ConsoleConfirm {
    fn review(&mut self, metadata: &AlbumMetadata, plan: &Plan) -> Result<Verdict> {
        if !plan.keeps.is_empty() {
            println!("== Going to keep {} files as they are:", plan.keeps.len());
            for path in &plan.keeps {
                println!("   {path}");
            }
            println!();
        }
        if !plan.moves.is_empty() {
            println!("== Going to move {} files:", plan.moves.len());
            let width = plan.moves.iter().map(|op| op.src.len()).max().unwrap_or(0) + 2;
            for op in &plan.moves {
                println!("   {:<width$} ==>  {}", op.src, op.dst);
            }
            println!();
        }
        if !plan.deletes.is_empty() {
            println!("== Going to delete {} files & dirs:", plan.deletes.len());
            for path in &plan.deletes {
                println!("   {path}");
            }
            println!();
        }
        if !plan.downloads.is_empty() {
            println!("== Going to download {} files:", plan.downloads.len());
            let width = plan.downloads.iter().map(|op| op.src.len()).max().unwrap_or(0) + 2;
            for op in &plan.downloads {
                println!("   {:<width$} ==>  {}", op.src, op.dst);
            }
            println!();
        }

        if plan.is_settled() {
            println!("{} - {} all good\n", metadata.artist, metadata.album);
            return Ok(Verdict::AlreadyDone);
        }

        print!("OK to continue? [yN] ");
        io::stdout().flush().context("failed to flush prompt")?;
        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("failed to read confirmation")?;
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => Ok(Verdict::Approved),
            _ => Ok(Verdict::Cancelled),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("failed to move {src} -> {dst}: {source}")]
    Move {
        src: String,
        dst: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to delete {path}: {source}")]
    Delete {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to download {src} -> {dst}: {reason}")]
    Download {
        src: String,
        dst: String,
        reason: String,
    },
}

/// Host filesystem primitives the apply step is built on. Paths are
/// relative to the album root.
pub trait AlbumFs {
    fn move_entry(&mut self, root: &Path, src: &str, dst: &str) -> Result<(), ApplyError>;
    fn remove_entry(&mut self, root: &Path, path: &str) -> Result<(), ApplyError>;
    fn download(&mut self, root: &Path, src: &str, dst: &str) -> Result<(), ApplyError>;
}

/// Production filesystem: std moves/removals plus blocking HTTP downloads.
pub struct LocalFs {
    client: reqwest::blocking::Client,
}

impl LocalFs {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for LocalFs {
    fn default() -> Self {
        Self::new()
    }
}

impl AlbumFs for LocalFs {
    fn move_entry(&mut self, root: &Path, src: &str, dst: &str) -> Result<(), ApplyError> {
        fs::rename(root.join(src), root.join(dst)).map_err(|source| ApplyError::Move {
            src: src.to_string(),
            dst: dst.to_string(),
            source,
        })
    }

    fn remove_entry(&mut self, root: &Path, path: &str) -> Result<(), ApplyError> {
        let full = root.join(path);
        if full.is_file() {
            fs::remove_file(&full).map_err(|source| ApplyError::Delete {
                path: path.to_string(),
                source,
            })
        } else if full.is_dir() {
            fs::remove_dir_all(&full).map_err(|source| ApplyError::Delete {
                path: path.to_string(),
                source,
            })
        } else {
            // already gone, or something we cannot classify
            warn!(path = %path, "not sure how to delete, skipping");
            Ok(())
        }
    }

    fn download(&mut self, root: &Path, src: &str, dst: &str) -> Result<(), ApplyError> {
        let fetch = || -> anyhow::Result<()> {
            let response = self.client.get(src).send()?.error_for_status()?;
            let bytes = response.bytes()?;
            fs::write(root.join(dst), &bytes)?;
            Ok(())
        };
        fetch().map_err(|err| ApplyError::Download {
            src: src.to_string(),
            dst: dst.to_string(),
            reason: format!("{err:#}"),
        })
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// How one album's pipeline concluded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlbumOutcome {
    /// Plan approved and applied.
    Fixed,
    /// Already in canonical form; nothing to do.
    AlreadyDone,
    /// Reviewer declined the plan.
    Cancelled,
}

impl AlbumOutcome {
    pub fn status(self) -> AlbumStatus {
        match self {
            AlbumOutcome::Fixed | AlbumOutcome::AlreadyDone => AlbumStatus::Finished,
            AlbumOutcome::Cancelled => AlbumStatus::Skipped,
        }
    }
}

fn apply_plan<F: AlbumFs>(plan: &Plan, root: &Path, fs: &mut F) -> Result<(), ApplyError> {
    for op in plan.operations() {
        match op {
            Operation::Keep(_) => {}
            Operation::Move(mv) => fs.move_entry(root, &mv.src, &mv.dst)?,
            Operation::Delete(path) => fs.remove_entry(root, &path)?,
            Operation::Download(dl) => {
                let spinner = create_spinner(&format!("downloading {}", dl.dst));
                let result = fs.download(root, &dl.src, &dl.dst);
                spinner.finish_and_clear();
                result?;
            }
        }
    }
    Ok(())
}

/// Run the full pipeline for one album.
///
/// Any error is returned to the caller; the loop maps it to an `Error`
/// status instead of aborting the run.
pub fn reconcile_album<C, P, F>(
    album: &AlbumDir,
    catalog: &C,
    confirm: &mut P,
    fs: &mut F,
    delete: bool,
) -> Result<AlbumOutcome>
where
    C: Catalog,
    P: Confirm,
    F: AlbumFs,
{
    let spinner = create_spinner(&format!(
        "fetching metadata for {} - {}",
        album.artist, album.album
    ));
    let metadata = catalog.album_metadata(&album.artist, &album.album);
    spinner.finish_and_clear();
    let metadata = metadata?;

    let mut listing = list_album_dir(&album.path)?;
    let (mut moves, downloads) = match_album_art(&mut listing.other_files, &metadata);
    moves.extend(match_tracks(&mut listing.music_files, &metadata));
    let plan = build_plan(moves, downloads, &listing, delete);

    match confirm.review(&metadata, &plan)? {
        Verdict::AlreadyDone => return Ok(AlbumOutcome::AlreadyDone),
        Verdict::Cancelled => return Ok(AlbumOutcome::Cancelled),
        Verdict::Approved => {}
    }

    apply_plan(&plan, &album.path, fs)?;
    info!("finished fixing up {} - {}", metadata.artist, metadata.album);
    Ok(AlbumOutcome::Fixed)
}

// ============================================================================
// Run Loop
// ============================================================================

pub struct RunOptions {
    pub base_dir: PathBuf,
    /// When false, leftover files are never deleted.
    pub delete: bool,
    /// Reprocess albums already recorded as finished.
    pub force: bool,
    pub ignore_file: PathBuf,
}

/// Iterate every discovered album, reconciling each in turn.
///
/// Status is written exactly once per processed album, after its pipeline
/// concludes; a failing album is recorded as `Error` and the loop moves on.
pub fn run<C, S, P, F>(
    opts: &RunOptions,
    catalog: &C,
    status: &S,
    confirm: &mut P,
    fs: &mut F,
) -> Result<()>
where
    C: Catalog,
    S: KeyValueStore,
    P: Confirm,
    F: AlbumFs,
{
    let ignore = load_ignore_list(&opts.ignore_file)?;
    let albums = discover_albums(&opts.base_dir, &ignore)?;
    for album in &albums {
        let key = album.status_key();
        if !opts.force && status.get::<AlbumStatus>(&key)? == Some(AlbumStatus::Finished) {
            info!(album = %key, "skipping already finished album");
            continue;
        }
        println!("\n= Working on {key} =\n");
        let recorded = match reconcile_album(album, catalog, confirm, fs, opts.delete) {
            Ok(outcome) => outcome.status(),
            Err(err) => {
                error!(album = %key, "failed fixing up album: {err:#}");
                AlbumStatus::Error
            }
        };
        status.put(&key, &recorded)?;
    }
    Ok(())
}
