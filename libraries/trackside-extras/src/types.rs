//! Common types for the organizer

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Read-only view of the media item that triggered a relocation event.
///
/// The host library owns the full track model; the organizer only needs a
/// handful of string accessors for template substitution.
pub trait MediaItem {
    /// Track artist, if tagged
    fn artist(&self) -> Option<&str>;

    /// Album artist, if tagged
    fn album_artist(&self) -> Option<&str>;

    /// Album title, if tagged
    fn album(&self) -> Option<&str>;
}

/// Whether a batch transfers files by copying or by moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransferAction {
    /// Copy to the destination (preserves the source)
    #[default]
    Copy,

    /// Move to the destination (removes the source)
    Move,
}

/// One pending relocation of an extra file.
///
/// Identity is the `(source, destination)` pair; duplicates discovered
/// across events collapse via set semantics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtraFileTask {
    /// Absolute path of the extra file (or directory) to relocate
    pub source: PathBuf,

    /// Absolute path it should land at
    pub destination: PathBuf,
}

impl ExtraFileTask {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Metadata snapshot taken when a relocation event arrives.
///
/// Missing string fields fall back to the literal `"None"`, mirroring how
/// the host renders absent tags in paths.
#[derive(Debug, Clone)]
pub struct RelocationMetadata {
    pub artist: String,
    pub album_artist: String,
    pub album: String,

    /// Parent directory of the destination media file
    pub album_dir: PathBuf,
}

impl RelocationMetadata {
    /// Snapshot an item's tags against the destination media path
    pub fn from_item(item: &dyn MediaItem, media_destination: &Path) -> Self {
        let album_dir = media_destination
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            artist: item.artist().unwrap_or("None").to_string(),
            album_artist: item.album_artist().unwrap_or("None").to_string(),
            album: item.album().unwrap_or("None").to_string(),
            album_dir,
        }
    }
}

/// Statistics from executing one batch of transfer tasks
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransferStats {
    /// Tasks performed successfully
    pub transferred: usize,

    /// Tasks skipped because the source vanished
    pub skipped_missing: usize,

    /// Tasks skipped because the destination already existed
    pub skipped_conflict: usize,

    /// Tasks that failed mid-operation
    pub failed: usize,
}

impl TransferStats {
    pub fn total(&self) -> usize {
        self.transferred + self.skipped_missing + self.skipped_conflict + self.failed
    }
}

/// Combined result of flushing a session (copies first, then moves)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub copies: TransferStats,
    pub moves: TransferStats,
}

impl SessionSummary {
    pub fn summary_text(&self) -> String {
        format!(
            "Extra files: {} copied, {} moved, {} skipped, {} failed",
            self.copies.transferred,
            self.moves.transferred,
            self.copies.skipped_missing
                + self.copies.skipped_conflict
                + self.moves.skipped_missing
                + self.moves.skipped_conflict,
            self.copies.failed + self.moves.failed,
        )
    }
}
