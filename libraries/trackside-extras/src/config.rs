//! Configuration types for the organizer
//!
//! The host application parses its own configuration format; the organizer
//! consumes the already-parsed value. Both tables are ordered: categories
//! are evaluated in declaration order, and path rules are first-match-wins.

use serde::{Deserialize, Serialize};

/// Template applied when no path rule matches a category
pub const DEFAULT_TEMPLATE: &str = "$albumpath/$filename";

/// Glob patterns for one category of extra files
///
/// A pattern ending in `/` matches directories only (e.g. `scans/`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPatterns {
    /// Category name (unique across the config)
    pub name: String,

    /// Glob patterns, relative to the media file's directory
    pub patterns: Vec<String>,
}

impl CategoryPatterns {
    pub fn new(name: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            name: name.into(),
            patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

/// Destination template for one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRule {
    /// Category this rule applies to (exact match)
    pub category: String,

    /// Destination path template (e.g. `$albumpath/artwork`)
    pub template: String,
}

impl PathRule {
    pub fn new(category: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            template: template.into(),
        }
    }
}

/// Parsed organizer configuration
///
/// Loaded once at startup and immutable thereafter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtrasConfig {
    /// Categorized glob patterns for discovery
    #[serde(default)]
    pub patterns: Vec<CategoryPatterns>,

    /// Per-category destination templates, checked in order
    #[serde(default)]
    pub paths: Vec<PathRule>,
}
