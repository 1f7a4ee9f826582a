//! Discovery of extra files alongside relocated media
//!
//! When a media file is relocated out of a directory, the logs, cue sheets
//! and artwork folders next to it are matched against per-category glob
//! patterns. Media files themselves are never re-captured, and a directory
//! is scanned at most once per session.

use crate::{config::CategoryPatterns, ExtrasError, Result};
use globset::{GlobBuilder, GlobMatcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recognized media file extensions (lowercase, no dot)
///
/// Matches the host library's supported formats; overridable via
/// [`ExtraFileScanner::with_media_extensions`].
pub const DEFAULT_MEDIA_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "oga", "opus", "wav", "aac", "m4a", "alac", "ape", "wv", "mpc", "asf",
    "wma", "aif", "aiff", "dsf",
];

/// One compiled glob pattern
#[derive(Debug)]
struct CompiledPattern {
    matcher: GlobMatcher,
    /// Pattern ended in `/`: matches directories only
    dirs_only: bool,
}

/// One category with its compiled patterns, in declaration order
#[derive(Debug)]
struct CompiledCategory {
    name: String,
    patterns: Vec<CompiledPattern>,
}

/// Scanner for extra files in a media file's directory
#[derive(Debug)]
pub struct ExtraFileScanner {
    categories: Vec<CompiledCategory>,
    media_extensions: HashSet<String>,
}

impl ExtraFileScanner {
    /// Compile all category patterns.
    ///
    /// Malformed glob patterns are configuration errors and propagate.
    pub fn new(categories: &[CategoryPatterns]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(categories.len());

        for category in categories {
            let mut patterns = Vec::with_capacity(category.patterns.len());
            for pattern in &category.patterns {
                let dirs_only = pattern.ends_with('/');
                let trimmed = pattern.trim_end_matches('/');

                // `*` must not cross directory boundaries, so `*.log` only
                // matches directly inside the scanned directory
                let matcher = GlobBuilder::new(trimmed)
                    .literal_separator(true)
                    .build()
                    .map_err(|source| ExtrasError::Pattern {
                        category: category.name.clone(),
                        pattern: pattern.clone(),
                        source,
                    })?
                    .compile_matcher();

                patterns.push(CompiledPattern { matcher, dirs_only });
            }
            compiled.push(CompiledCategory {
                name: category.name.clone(),
                patterns,
            });
        }

        Ok(Self {
            categories: compiled,
            media_extensions: DEFAULT_MEDIA_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_string())
                .collect(),
        })
    }

    /// Replace the recognized media extension set (the host's oracle)
    pub fn with_media_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.media_extensions = extensions
            .into_iter()
            .map(|ext| ext.into().to_lowercase())
            .collect();
        self
    }

    /// Check whether a path carries a recognized media extension
    pub fn is_media_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.media_extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Find extra files next to a relocated media file.
    ///
    /// Returns `(path, category)` pairs in category/pattern declaration
    /// order. The media file's directory is looked up in `scanned_dirs`
    /// first: a directory is scanned at most once per session, so repeated
    /// events for tracks of the same album yield nothing new. On a real
    /// scan the directory is marked scanned even if no files matched.
    ///
    /// Duplicate pairs across overlapping patterns are possible here;
    /// the pending task sets deduplicate later.
    pub fn find_extra_files(
        &self,
        media_path: &Path,
        scanned_dirs: &mut HashSet<PathBuf>,
    ) -> Vec<(PathBuf, String)> {
        let Some(source_dir) = media_path.parent() else {
            return Vec::new();
        };
        if source_dir.as_os_str().is_empty() || scanned_dirs.contains(source_dir) {
            return Vec::new();
        }

        // Collect entries once; matching happens against paths relative to
        // the scanned directory, so glob metacharacters in the directory
        // name itself are never interpreted
        let mut entries: Vec<(PathBuf, PathBuf, bool)> = WalkDir::new(source_dir)
            .min_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(source_dir).ok()?.to_path_buf();
                let is_dir = entry.file_type().is_dir();
                Some((entry.path().to_path_buf(), relative, is_dir))
            })
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1));

        let mut matches = Vec::new();
        for category in &self.categories {
            for pattern in &category.patterns {
                for (path, relative, is_dir) in &entries {
                    if pattern.dirs_only && !*is_dir {
                        continue;
                    }
                    if !pattern.matcher.is_match(relative) {
                        continue;
                    }
                    if self.is_media_file(path) {
                        continue;
                    }
                    matches.push((path.clone(), category.name.clone()));
                }
            }
        }

        scanned_dirs.insert(source_dir.to_path_buf());
        matches
    }
}
