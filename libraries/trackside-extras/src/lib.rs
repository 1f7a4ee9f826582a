//! Trackside Extra Files Organizer
//!
//! When a media file is copied or moved into an organized library location,
//! the non-media files living alongside it (ripper logs, cue sheets,
//! artwork folders) are left behind. This crate relocates them to
//! destinations derived from per-category path templates.
//!
//! # Features
//!
//! - Pattern-driven discovery of extra files, with media files excluded
//!   and each directory scanned at most once per session
//! - Template-based destination paths (`$albumpath/artwork`) with host
//!   metadata substitution and filename sanitization
//! - Deferred batch execution: tasks accumulate during the run and flush
//!   once at session end, copies before moves
//! - Per-task failure isolation: a vanished source, an occupied
//!   destination, or an I/O error skips that task only
//!
//! # Architecture
//!
//! - `config`: parsed pattern and path-template tables
//! - `template`: placeholder substitution with injected host functions
//! - `scanner`: extra-file discovery in a media file's directory
//! - `resolver`: category template lookup and destination computation
//! - `transfer`: copy/move/unique-path filesystem primitives
//! - `executor`: conflict-aware batch execution
//! - `session`: event intake, task accumulation, flush

mod error;
mod types;

// Core modules
pub mod config;
pub mod executor;
pub mod resolver;
pub mod scanner;
pub mod session;
pub mod template;
pub mod transfer;

pub use error::ExtrasError;
pub use session::ExtrasOrganizer;
pub use types::*;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, ExtrasError>;
