//! Destination resolution for discovered extra files
//!
//! Combines a `(path, category)` pair with the relocation metadata: the
//! category's template (or the default) renders the destination, the
//! original extension is re-appended verbatim, and only the final path
//! component is made filesystem-safe.

use crate::{
    config::{PathRule, DEFAULT_TEMPLATE},
    template::{FunctionTable, PathTemplate, TemplateContext},
    types::RelocationMetadata,
    ExtrasError, Result,
};
use std::path::{Path, PathBuf};

/// Resolver from discovered extra files to destination paths
#[derive(Debug)]
pub struct DestinationResolver {
    /// `(category, template)` pairs, first exact match wins
    rules: Vec<(String, PathTemplate)>,
    default_template: PathTemplate,
    functions: FunctionTable,
}

impl DestinationResolver {
    /// Parse every rule template plus the default template.
    ///
    /// Template syntax errors are configuration errors and propagate.
    pub fn new(rules: &[PathRule], functions: FunctionTable) -> Result<Self> {
        let mut parsed = Vec::with_capacity(rules.len());
        for rule in rules {
            parsed.push((rule.category.clone(), PathTemplate::parse(&rule.template)?));
        }

        Ok(Self {
            rules: parsed,
            default_template: PathTemplate::parse(DEFAULT_TEMPLATE)?,
            functions,
        })
    }

    /// Replace the injected template function table
    pub fn with_functions(mut self, functions: FunctionTable) -> Self {
        self.functions = functions;
        self
    }

    /// Compute the destination path for one discovered extra file.
    ///
    /// The extension (including the dot, original case) survives even when
    /// the rendered template has no placeholder for the base filename, so
    /// `$albumpath/audio` applied to `rip.log` yields `.../audio.log`.
    pub fn resolve(
        &self,
        file_path: &Path,
        category: &str,
        meta: &RelocationMetadata,
    ) -> Result<PathBuf> {
        let stem = file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ExtrasError::InvalidPath(file_path.display().to_string()))?;
        let extension = file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        let context = TemplateContext {
            artist: meta.artist.clone(),
            album_artist: meta.album_artist.clone(),
            album: meta.album.clone(),
            album_path: meta.album_dir.to_string_lossy().into_owned(),
            filename: stem.to_string(),
        };

        let template = self
            .rules
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, template)| template)
            .unwrap_or(&self.default_template);

        let rendered = format!("{}{extension}", template.render(&context, &self.functions));

        // Only the filename is sanitized; intermediate components come from
        // `albumpath` and are already real directories
        Ok(match rendered.rsplit_once('/') {
            Some(("", filename)) => Path::new("/").join(sanitize_path_component(filename)),
            Some((directory, filename)) => {
                Path::new(directory).join(sanitize_path_component(filename))
            }
            None => PathBuf::from(sanitize_path_component(&rendered)),
        })
    }
}

/// Sanitize a single path component for filesystem safety
///
/// Removes/replaces characters that are invalid on common filesystems
pub fn sanitize_path_component(s: &str) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| match c {
            // Invalid on Windows: < > : " / \ | ? *
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            // Control characters
            c if c.is_control() => '_',
            // Keep everything else
            c => c,
        })
        .collect();

    // Trim whitespace and dots (Windows doesn't like trailing dots)
    let trimmed = sanitized.trim().trim_end_matches('.');

    // Handle reserved names on Windows
    let reserved = [
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];

    let upper = trimmed.to_uppercase();
    if reserved.contains(&upper.as_str()) {
        format!("_{}", trimmed)
    } else if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_meta() -> RelocationMetadata {
        RelocationMetadata {
            artist: "Queen".to_string(),
            album_artist: "Queen".to_string(),
            album: "A Night at the Opera".to_string(),
            album_dir: PathBuf::from("/dst/album"),
        }
    }

    fn test_resolver() -> DestinationResolver {
        let rules = vec![
            PathRule::new("artwork", "$albumpath/artwork"),
            PathRule::new("log", "$albumpath/audio"),
        ];
        DestinationResolver::new(&rules, FunctionTable::new()).unwrap()
    }

    #[test]
    fn test_directory_category_collapses_to_template_path() {
        let resolver = test_resolver();
        let dest = resolver
            .resolve(Path::new("/src/album/scans"), "artwork", &test_meta())
            .unwrap();
        assert_eq!(dest, PathBuf::from("/dst/album/artwork"));
    }

    #[test]
    fn test_extension_is_preserved() {
        let resolver = test_resolver();
        let dest = resolver
            .resolve(Path::new("/src/album/file.log"), "log", &test_meta())
            .unwrap();
        assert_eq!(dest, PathBuf::from("/dst/album/audio.log"));
    }

    #[test]
    fn test_extension_case_is_verbatim() {
        let resolver = test_resolver();
        let dest = resolver
            .resolve(Path::new("/src/album/RIP.LOG"), "log", &test_meta())
            .unwrap();
        assert_eq!(dest, PathBuf::from("/dst/album/audio.LOG"));
    }

    #[test]
    fn test_unconfigured_category_falls_back_to_default() {
        let resolver = test_resolver();
        let dest = resolver
            .resolve(Path::new("/src/album/file.cue"), "cue", &test_meta())
            .unwrap();
        assert_eq!(dest, PathBuf::from("/dst/album/file.cue"));
    }

    #[test]
    fn test_only_final_component_is_sanitized() {
        let rules = vec![PathRule::new("log", "$albumpath/$artist: notes")];
        let resolver = DestinationResolver::new(&rules, FunctionTable::new()).unwrap();

        let mut meta = test_meta();
        meta.album_dir = PathBuf::from("/dst/w.e.i.r.d/album");

        let dest = resolver
            .resolve(Path::new("/src/album/rip.log"), "log", &meta)
            .unwrap();
        assert_eq!(dest, PathBuf::from("/dst/w.e.i.r.d/album/Queen_ notes.log"));
    }

    #[test]
    fn test_host_function_applies() {
        let mut functions = FunctionTable::new();
        functions.register("lower", |s: &str| s.to_lowercase());

        let rules = vec![PathRule::new("log", "$albumpath/%lower{$filename}")];
        let resolver = DestinationResolver::new(&rules, functions).unwrap();

        let dest = resolver
            .resolve(Path::new("/src/album/RIP.log"), "log", &test_meta())
            .unwrap();
        assert_eq!(dest, PathBuf::from("/dst/album/rip.log"));
    }

    #[test]
    fn test_template_syntax_error_propagates() {
        let rules = vec![PathRule::new("log", "${albumpath/audio")];
        let err = DestinationResolver::new(&rules, FunctionTable::new()).unwrap_err();
        assert!(matches!(err, ExtrasError::Template { .. }));
    }

    #[test]
    fn test_sanitize_path_component() {
        assert_eq!(sanitize_path_component("Valid Name"), "Valid Name");
        assert_eq!(sanitize_path_component("Artist/Album"), "Artist_Album");
        assert_eq!(sanitize_path_component("Song: The Remix"), "Song_ The Remix");
        assert_eq!(sanitize_path_component("A<B>C"), "A_B_C");
        assert_eq!(sanitize_path_component("  Trimmed  "), "Trimmed");
        assert_eq!(sanitize_path_component("trailing..."), "trailing");
        assert_eq!(sanitize_path_component("CON"), "_CON"); // Windows reserved
        assert_eq!(sanitize_path_component(""), "_");
    }
}
