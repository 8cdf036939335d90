//! go.mod require-index parsing
//!
//! Handles:
//! - require statements (single and block)
//! - // indirect comments for classification
//! - duplicate entries (direct always wins, independent of order)
//!
//! Only the require entries matter here; directives the checker does not
//! need to understand (module, go, replace, exclude, ...) fall out of the
//! entry shape and are skipped without error.

use crate::error::ManifestError;
use std::collections::HashMap;
use std::path::Path;

/// Maps module path -> indirect?
///
/// A value of `false` means direct; `true` means the entry was listed with
/// a `// indirect` comment. Covers only modules explicitly declared in
/// go.mod. Built once per run and read-only afterward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequireIndex {
    entries: HashMap<String, bool>,
}

impl RequireIndex {
    /// Reads and parses the go.mod at `path`.
    ///
    /// An unreadable file is a hard error; malformed content inside the
    /// file never is.
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ManifestError::read(path, e))?;
        Ok(Self::parse(&contents))
    }

    /// Parses go.mod contents into a require index.
    pub fn parse(contents: &str) -> Self {
        let mut idx = Self::default();
        let mut in_require_block = false;

        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with("require (") {
                in_require_block = true;
                continue;
            }
            if in_require_block && line == ")" {
                in_require_block = false;
                continue;
            }

            if let Some(rest) = line.strip_prefix("require ") {
                idx.record_entry(rest.trim());
                continue;
            }

            if in_require_block {
                idx.record_entry(line);
            }
        }

        idx
    }

    /// Records one `<path> <version> [// comment]` entry line.
    ///
    /// Lines with fewer than two fields after stripping the comment are
    /// skipped. If the module was already recorded as direct it stays
    /// direct; a direct sighting upgrades a previously indirect entry.
    fn record_entry(&mut self, line: &str) {
        let (entry, comment) = match line.find("//") {
            Some(i) => (line[..i].trim(), &line[i + 2..]),
            None => (line, ""),
        };

        let mut fields = entry.split_whitespace();
        let path = match fields.next() {
            Some(p) => p,
            None => return,
        };
        if fields.next().is_none() {
            return;
        }

        let indirect = comment.contains("indirect");

        match self.entries.get_mut(path) {
            Some(existing) => *existing = *existing && indirect,
            None => {
                self.entries.insert(path.to_string(), indirect);
            }
        }
    }

    /// Returns the indirect flag for a declared module, or None when the
    /// module is not declared in go.mod at all.
    pub fn get(&self, path: &str) -> Option<bool> {
        self.entries.get(path).copied()
    }

    /// True when the module is declared in go.mod.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
