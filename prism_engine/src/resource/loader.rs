/// Resource loaders and resource path conventions
///
/// Resource files are named `name.kind.format` (`plane.model.text`,
/// `pbr.shader.binary`): `kind` picks the factory and `format` the decoder.
/// Paths may start with `<tag>` placeholders expanded by the loader.

use std::path::PathBuf;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};

// ===== RESOURCE PATH =====

/// Parsed `name.kind.format` resource path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    /// Path as given
    pub path: String,
    /// File name without `.kind.format`
    pub name: String,
    pub kind: String,
    pub format: String,
}

impl ResourcePath {
    pub fn parse(path: &str) -> Result<Self> {
        let file_name = path.rsplit(&['/', '\\'][..]).next().unwrap_or(path);
        let mut parts = file_name.rsplitn(3, '.');
        let format = parts.next().filter(|s| !s.is_empty());
        let kind = parts.next().filter(|s| !s.is_empty());
        let name = parts.next().filter(|s| !s.is_empty());

        match (name, kind, format) {
            (Some(name), Some(kind), Some(format)) => Ok(Self {
                path: path.to_string(),
                name: name.to_string(),
                kind: kind.to_string(),
                format: format.to_string(),
            }),
            _ => Err(Error::InvalidResource(format!(
                "'{}' does not follow the name.kind.format convention", path))),
        }
    }

    /// Fail unless the path names a resource of `kind`
    pub fn expect_kind(&self, kind: &str) -> Result<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(Error::InvalidResource(format!(
                "'{}' is a {} resource, expected {}", self.path, self.kind, kind)))
        }
    }
}

/// Resolve `relative` against the directory of `base_file`
///
/// Absolute and tagged paths are returned unchanged.
pub fn resolve_relative(base_file: &str, relative: &str) -> String {
    if relative.starts_with('/') || relative.starts_with('<') {
        return relative.to_string();
    }
    match base_file.rfind('/') {
        Some(slash) => format!("{}/{}", &base_file[..slash], relative),
        None => relative.to_string(),
    }
}

// ===== LOADER TRAIT =====

/// Source of raw resource bytes
pub trait ResourceLoader: Send + Sync {
    fn exists(&self, path: &str) -> bool;

    fn read(&self, path: &str) -> Result<Vec<u8>>;
}

// ===== FILE SYSTEM LOADER =====

/// Reads resources from disk below a root directory
pub struct FileSystemLoader {
    root: PathBuf,
    tags: FxHashMap<String, String>,
}

impl FileSystemLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), tags: FxHashMap::default() }
    }

    /// Register a `<tag>` replacement
    pub fn add_path_tag(&mut self, tag: &str, replacement: &str) {
        self.tags.insert(tag.to_string(), replacement.to_string());
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Expand `<tag>` placeholders; unknown tags are an error
    pub fn expand_tags(&self, path: &str) -> Result<String> {
        let mut expanded = String::with_capacity(path.len());
        let mut rest = path;
        while let Some(open) = rest.find('<') {
            let close = rest[open..].find('>')
                .map(|offset| open + offset)
                .ok_or_else(|| Error::InvalidResource(format!("unclosed tag in '{}'", path)))?;
            let tag = &rest[open + 1..close];
            let replacement = self.tags.get(tag)
                .ok_or_else(|| Error::NotFound(format!("path tag <{}>", tag)))?;
            expanded.push_str(&rest[..open]);
            expanded.push_str(replacement);
            rest = &rest[close + 1..];
        }
        expanded.push_str(rest);
        Ok(expanded)
    }

    /// On-disk location of a resource path
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let expanded = self.expand_tags(path)?;
        Ok(self.root.join(expanded.trim_start_matches('/')))
    }
}

impl ResourceLoader for FileSystemLoader {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let resolved = self.resolve(path)?;
        std::fs::read(&resolved).map_err(|err| Error::Io(format!("{}: {}", resolved.display(), err)))
    }
}

// ===== MEMORY LOADER =====

/// In-memory resource table (embedded assets, tests)
#[derive(Default)]
pub struct MemoryLoader {
    files: FxHashMap<String, Vec<u8>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, data: impl Into<Vec<u8>>) {
        self.files.insert(path.to_string(), data.into());
    }

    /// Builder form of `insert`
    pub fn with(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ResourceLoader for MemoryLoader {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("resource '{}'", path)))
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
