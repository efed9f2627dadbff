//! Document selection for directory aggregation.
//!
//! A [`DocumentCollection`] filters relative document paths with glob
//! patterns and assigns each selected document a stable identifier-safe key.
//! Walking the file system is left to the caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glob::Pattern;
use markflow_config::CollectionConfig;

/// Document collection error.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// Invalid glob pattern.
    #[error("Invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    /// Two documents map to the same key.
    #[error("Documents {} and {} share the key {key:?}", .first.display(), .second.display())]
    DuplicateKey {
        key: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// A selected document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectedDocument {
    /// Identifier-safe key derived from the file stem.
    pub key: String,
    /// Path relative to the collection root.
    pub path: PathBuf,
    /// Path joined onto the collection root.
    pub full_path: PathBuf,
}

/// Glob-filtered set of documents under a root directory.
///
/// Patterns match the whole relative path and `*` crosses `/`, so `*.md`
/// selects Markdown files at any depth.
#[derive(Clone, Debug)]
pub struct DocumentCollection {
    root: PathBuf,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl DocumentCollection {
    /// Create a collection that selects every `.md` file under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Create a collection from the `[collection]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::Pattern` if a configured pattern is invalid.
    pub fn from_config(config: &CollectionConfig) -> Result<Self, CollectionError> {
        let mut collection = Self::new(config.root.clone());
        for pattern in &config.include {
            collection = collection.include(pattern)?;
        }
        for pattern in &config.exclude {
            collection = collection.exclude(pattern)?;
        }
        Ok(collection)
    }

    /// Add a pattern of documents to select.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::Pattern` if the pattern is invalid.
    pub fn include(mut self, pattern: &str) -> Result<Self, CollectionError> {
        self.include.push(compile(pattern)?);
        Ok(self)
    }

    /// Add a pattern of documents to leave out.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::Pattern` if the pattern is invalid.
    pub fn exclude(mut self, pattern: &str) -> Result<Self, CollectionError> {
        self.exclude.push(compile(pattern)?);
        Ok(self)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check whether a relative path belongs to the collection.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let included = if self.include.is_empty() {
            path.extension().is_some_and(|ext| ext == "md")
        } else {
            self.include.iter().any(|pattern| pattern.matches_path(path))
        };
        included && !self.exclude.iter().any(|pattern| pattern.matches_path(path))
    }

    /// Select documents from relative paths, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::DuplicateKey` if two selected documents map
    /// to the same key.
    pub fn select<I, P>(&self, paths: I) -> Result<Vec<CollectedDocument>, CollectionError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut selected: Vec<PathBuf> = paths
            .into_iter()
            .map(|path| path.as_ref().to_path_buf())
            .filter(|path| self.matches(path))
            .collect();
        selected.sort();
        selected.dedup();

        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        let mut documents = Vec::with_capacity(selected.len());
        for path in selected {
            let key = document_key(&path);
            if let Some(first) = seen.get(&key) {
                return Err(CollectionError::DuplicateKey {
                    key,
                    first: first.clone(),
                    second: path,
                });
            }
            seen.insert(key.clone(), path.clone());
            documents.push(CollectedDocument {
                key,
                full_path: self.root.join(&path),
                path,
            });
        }

        tracing::debug!(
            root = %self.root.display(),
            documents = documents.len(),
            "Selected documents"
        );
        Ok(documents)
    }
}

fn compile(pattern: &str) -> Result<Pattern, CollectionError> {
    Pattern::new(pattern).map_err(|source| CollectionError::Pattern {
        pattern: pattern.to_owned(),
        source,
    })
}

/// Identifier-safe key of a document.
///
/// The file stem with every character outside `[A-Za-z0-9]` replaced by `_`,
/// prefixed with `_` when it would start with a digit.
///
/// ```
/// use std::path::Path;
/// use markflow::document_key;
///
/// assert_eq!(document_key(Path::new("guide/getting-started.md")), "getting_started");
/// assert_eq!(document_key(Path::new("2024 notes.md")), "_2024_notes");
/// ```
#[must_use]
pub fn document_key(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    let mut key: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if key.is_empty() || key.starts_with(|c: char| c.is_ascii_digit()) {
        key.insert(0, '_');
    }
    key
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn keys(documents: &[CollectedDocument]) -> Vec<&str> {
        documents.iter().map(|doc| doc.key.as_str()).collect()
    }

    #[test]
    fn test_default_selects_markdown() {
        let collection = DocumentCollection::new("/docs");
        let documents = collection
            .select(["b.md", "a.md", "guide/setup.md", "image.png", "notes.txt"])
            .unwrap();

        assert_eq!(keys(&documents), vec!["a", "b", "setup"]);
        assert_eq!(documents[2].path, PathBuf::from("guide/setup.md"));
        assert_eq!(documents[2].full_path, PathBuf::from("/docs/guide/setup.md"));
    }

    #[test]
    fn test_include_and_exclude() {
        let collection = DocumentCollection::new("/docs")
            .include("guide/*.md")
            .unwrap()
            .exclude("guide/draft-*")
            .unwrap();
        let documents = collection
            .select(["index.md", "guide/intro.md", "guide/draft-api.md"])
            .unwrap();

        assert_eq!(keys(&documents), vec!["intro"]);
    }

    #[test]
    fn test_duplicate_paths_collapse() {
        let documents = DocumentCollection::new(".")
            .select(["a.md", "a.md"])
            .unwrap();
        assert_eq!(documents.len(), 1);
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let err = DocumentCollection::new(".")
            .select(["en/intro.md", "de/intro.md"])
            .unwrap_err();

        match err {
            CollectionError::DuplicateKey { key, first, second } => {
                assert_eq!(key, "intro");
                assert_eq!(first, PathBuf::from("de/intro.md"));
                assert_eq!(second, PathBuf::from("en/intro.md"));
            }
            CollectionError::Pattern { .. } => panic!("unexpected pattern error"),
        }
    }

    #[test]
    fn test_invalid_pattern() {
        let err = DocumentCollection::new(".").include("[").unwrap_err();
        assert!(matches!(err, CollectionError::Pattern { ref pattern, .. } if pattern == "["));
    }

    #[test]
    fn test_from_config() {
        let config = CollectionConfig {
            root: PathBuf::from("/site"),
            include: vec!["*.md".to_owned()],
            exclude: vec!["drafts/*".to_owned()],
        };
        let collection = DocumentCollection::from_config(&config).unwrap();

        assert_eq!(collection.root(), Path::new("/site"));
        assert!(collection.matches(Path::new("guide/intro.md")));
        assert!(!collection.matches(Path::new("drafts/wip.md")));
    }

    #[test]
    fn test_document_key_sanitizes() {
        assert_eq!(document_key(Path::new("api.v2.md")), "api_v2");
        assert_eq!(document_key(Path::new("über.md")), "_ber");
        assert_eq!(document_key(Path::new("1-intro.md")), "_1_intro");
        assert_eq!(document_key(Path::new("README")), "README");
    }
}
