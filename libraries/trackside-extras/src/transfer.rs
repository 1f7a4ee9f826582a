//! Filesystem primitives for relocating extra files
//!
//! Plain files are copied byte-exact (optionally verified via SHA-256),
//! directories are duplicated recursively, and moves fall back to
//! copy-then-delete across filesystem boundaries.

use crate::{ExtrasError, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Default buffer size for file operations (64KB)
const BUFFER_SIZE: usize = 64 * 1024;

/// Upper bound on ` (n)` conflict suffix attempts
const MAX_CONFLICT_ATTEMPTS: usize = 1000;

/// Compute SHA256 hash of a file
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let hash = hasher.finalize();
    Ok(hex::encode(hash))
}

/// Copy a file with optional verification
pub fn copy_file_verified(source: &Path, dest: &Path, verify: bool) -> Result<()> {
    // Compute source hash if verification is enabled
    let source_hash = if verify {
        Some(compute_file_hash(source)?)
    } else {
        None
    };

    fs::copy(source, dest)?;

    if let Some(expected_hash) = source_hash {
        verify_copy(dest, &expected_hash)?;
        debug!("File verification passed: {:?}", dest);
    }

    Ok(())
}

/// Check a freshly written copy against the expected source hash.
///
/// On mismatch the corrupted copy is removed before the error is returned.
fn verify_copy(dest: &Path, expected_hash: &str) -> Result<()> {
    let actual_hash = compute_file_hash(dest)?;
    if expected_hash != actual_hash {
        // Delete the corrupted copy
        let _ = fs::remove_file(dest);
        return Err(ExtrasError::Verification(dest.to_path_buf()));
    }
    Ok(())
}

/// Recursively duplicate a directory tree.
///
/// Fails if `destination` already exists at the tree root; an upstream
/// exists-check and this one must both hold, and a race between them is a
/// hard failure for the task.
pub fn copy_tree(source: &Path, destination: &Path) -> Result<()> {
    if destination.exists() {
        return Err(ExtrasError::DestinationExists(destination.to_path_buf()));
    }
    fs::create_dir_all(destination)?;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry.path().strip_prefix(source).map_err(|_| {
            ExtrasError::InvalidPath(entry.path().display().to_string())
        })?;
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Move a file or directory to a new location.
///
/// Tries `rename` first (fast on the same filesystem), then falls back to
/// copy + delete so moves work across filesystem boundaries.
pub fn move_path(source: &Path, destination: &Path) -> Result<()> {
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }

    if source.is_dir() {
        copy_tree(source, destination)?;
        fs::remove_dir_all(source)?;
    } else {
        copy_file_verified(source, destination, true)?;
        fs::remove_file(source)?;
    }

    Ok(())
}

/// Find a free variant of a destination path.
///
/// Returns the path unchanged when nothing occupies it, otherwise appends
/// ` (1)`, ` (2)`, ... before the extension until a free name is found.
pub fn unique_path(destination: &Path) -> Result<PathBuf> {
    if !destination.exists() {
        return Ok(destination.to_path_buf());
    }

    let stem = destination
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ExtrasError::InvalidPath(destination.display().to_string()))?;
    let extension = destination
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");
    let parent = destination.parent().unwrap_or(Path::new(""));

    for counter in 1..MAX_CONFLICT_ATTEMPTS {
        let name = if extension.is_empty() {
            format!("{} ({})", stem, counter)
        } else {
            format!("{} ({}).{}", stem, counter, extension)
        };

        let candidate = parent.join(name);
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(ExtrasError::ConflictExhausted(destination.to_path_buf()))
}
