//! Filesystem operation plan.
//!
//! The plan builder is a pure transform: it merges the matcher's raw move
//! and download lists with the leftover directory listing into a single
//! reviewable `Plan`, suppressing no-op moves as keeps.

use crate::classify::DirectoryListing;

/// Rename within the album directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOp {
    pub src: String,
    pub dst: String,
}

/// Fetch of a remote asset into the album directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadOp {
    pub src: String,
    pub dst: String,
}

/// Tagged filesystem operation. `Keep` records a file that already has its
/// canonical name and needs no action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Keep(String),
    Move(MoveOp),
    Delete(String),
    Download(DownloadOp),
}

/// Reviewable set of operations for one album. Ordering of `moves` and
/// `downloads` matters only for display determinism.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    pub keeps: Vec<String>,
    pub moves: Vec<MoveOp>,
    pub deletes: Vec<String>,
    pub downloads: Vec<DownloadOp>,
}

impl Plan {
    /// True iff the album already matches the canonical layout.
    pub fn is_settled(&self) -> bool {
        self.moves.is_empty() && self.deletes.is_empty() && self.downloads.is_empty()
    }

    /// All operations in apply order: keeps (no-ops) first, then moves,
    /// deletes, and downloads. Moves run before deletes so files to keep are
    /// relocated before space is reclaimed; downloads run last.
    pub fn operations(&self) -> impl Iterator<Item = Operation> + '_ {
        self.keeps
            .iter()
            .map(|path| Operation::Keep(path.clone()))
            .chain(self.moves.iter().map(|op| Operation::Move(op.clone())))
            .chain(self.deletes.iter().map(|path| Operation::Delete(path.clone())))
            .chain(self.downloads.iter().map(|op| Operation::Download(op.clone())))
    }
}

/// Merge matcher output into a plan.
///
/// `leftovers` must be the listing *after* matching, i.e. with every move
/// source already consumed; whatever remains is deleted when `delete` is
/// set. Sources of suppressed no-op moves were consumed too, so they are
/// never deleted.
pub fn build_plan(
    raw_moves: Vec<MoveOp>,
    downloads: Vec<DownloadOp>,
    leftovers: &DirectoryListing,
    delete: bool,
) -> Plan {
    let (keeps, moves): (Vec<_>, Vec<_>) =
        raw_moves.into_iter().partition(|op| op.src == op.dst);
    let deletes = if delete {
        leftovers
            .music_files
            .iter()
            .chain(&leftovers.other_files)
            .chain(&leftovers.sub_dirs)
            .cloned()
            .collect()
    } else {
        Vec::new()
    };
    Plan {
        keeps: keeps.into_iter().map(|op| op.src).collect(),
        moves,
        deletes,
        downloads,
    }
}
