//! Unit file model.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use linkctl_common::{LinkError, LinkResult};

use crate::{parser, tokens};

/// One `[Section]` of a unit file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// Assignments per key, in file order.
    entries: IndexMap<String, Vec<String>>,
}

impl Section {
    /// Whether the section holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the key is assigned.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Last assignment of a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Tokens of every assignment of a key. An empty assignment resets the list.
    #[must_use]
    pub fn values(&self, key: &str) -> Vec<String> {
        let mut out = Vec::new();
        for value in self.entries.get(key).into_iter().flatten() {
            if value.is_empty() {
                out.clear();
            } else {
                out.extend(tokens::split(value));
            }
        }
        out
    }

    /// Key names, in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn push(&mut self, key: &str, value: &str) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries
            .insert(key.to_string(), vec![value.to_string()]);
    }

    fn remove(&mut self, key: &str) -> bool {
        self.entries.shift_remove(key).is_some()
    }
}

/// A unit file: its path and parsed sections.
///
/// Loading a missing file yields an empty unit. Mutators persist the unit
/// immediately, and a unit left without keys is removed from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    path: PathBuf,
    name: String,
    sections: IndexMap<String, Section>,
}

impl Unit {
    /// An empty unit at `path`, not yet written.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            sections: IndexMap::new(),
        }
    }

    /// Parse unit text as if it had been read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Parse`] when the text is not valid unit syntax.
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> LinkResult<Self> {
        let mut unit = Self::empty(path);
        unit.sections = parser::parse(&unit.path, text)?;
        Ok(unit)
    }

    /// Load a unit file. A missing file yields an empty unit.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> LinkResult<Self> {
        let path = path.into();
        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(path, &text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::empty(path)),
            Err(e) => Err(LinkError::io(&path, e)),
        }
    }

    /// Path of the unit file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the unit.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name without its type suffix.
    #[must_use]
    pub fn stem(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map_or(self.name.as_str(), |(stem, _)| stem)
    }

    /// A section by name.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// All sections, in file order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(name, s)| (name.as_str(), s))
    }

    /// Whether no section holds a key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.values().all(Section::is_empty)
    }

    /// Whether the unit file is present on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the unit, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory or the file cannot be written.
    pub fn save(&self) -> LinkResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| LinkError::io(parent, e))?;
        }
        fs::write(&self.path, self.to_string()).map_err(|e| LinkError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), "Saved unit");
        Ok(())
    }

    /// Remove the unit file, and its directory if that is left empty.
    ///
    /// A file that is already gone is not an error, and leaves its directory
    /// alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn delete(&self) -> LinkResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Deleted unit"),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(LinkError::io(&self.path, e)),
        }

        if let Some(dir) = self.path.parent() {
            if dir_is_empty(dir) {
                if let Err(e) = fs::remove_dir(dir) {
                    tracing::debug!(path = %dir.display(), error = %e, "Left unit directory in place");
                }
            }
        }
        Ok(())
    }

    /// Delete the unit file if it holds no keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    pub fn delete_if_empty(&self) -> LinkResult<()> {
        if self.is_empty() {
            self.delete()
        } else {
            Ok(())
        }
    }

    /// Last assignment of `key` in `section`.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(key))
    }

    /// Tokens of `key` in `section`.
    #[must_use]
    pub fn get_values(&self, section: &str, key: &str) -> Vec<String> {
        self.section(section)
            .map(|s| s.values(key))
            .unwrap_or_default()
    }

    /// Whether `value` is one of the tokens of `key` in `section`.
    #[must_use]
    pub fn contains_value(&self, section: &str, key: &str, value: &str) -> bool {
        self.get_values(section, key).iter().any(|v| v == value)
    }

    /// Assign `key` and save. An empty value removes the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit cannot be saved or deleted.
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> LinkResult<()> {
        if value.is_empty() {
            return self.remove(section, key);
        }

        self.sections
            .entry(section.to_string())
            .or_default()
            .set(key, value);
        self.save()
    }

    /// Assign `key` to the space separated `values` and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit cannot be saved or deleted.
    pub fn set_values(&mut self, section: &str, key: &str, values: &[String]) -> LinkResult<()> {
        self.set(section, key, &tokens::join(values))
    }

    /// Remove `key` from `section`. The file is deleted if the unit becomes
    /// empty, otherwise saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit cannot be saved or deleted.
    pub fn remove(&mut self, section: &str, key: &str) -> LinkResult<()> {
        let Some(s) = self.sections.get_mut(section) else {
            return Ok(());
        };
        s.remove(key);

        if self.is_empty() {
            self.delete()
        } else {
            self.save()
        }
    }

    /// Add `value` to the tokens of `key` unless already present.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit cannot be saved.
    pub fn include(&mut self, section: &str, key: &str, value: &str) -> LinkResult<()> {
        let mut values = self.get_values(section, key);
        if values.iter().any(|v| v == value) {
            return Ok(());
        }
        tokens::include(&mut values, value);
        self.set_values(section, key, &values)
    }

    /// Remove every occurrence of `value` from the tokens of `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit cannot be saved or deleted.
    pub fn exclude(&mut self, section: &str, key: &str, value: &str) -> LinkResult<()> {
        let mut values = self.get_values(section, key);
        tokens::exclude(&mut values, value);
        self.set_values(section, key, &values)
    }

    /// Swap `old` for `new` in the tokens of `key`, appending `new` once.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit cannot be saved.
    pub fn replace(&mut self, section: &str, key: &str, old: &str, new: &str) -> LinkResult<()> {
        let mut values = self.get_values(section, key);
        tokens::replace(&mut values, old, new);
        self.set_values(section, key, &values)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, section)) in self.sections.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{name}]")?;
            for (key, values) in &section.entries {
                for value in values {
                    writeln!(f, "{key}={value}")?;
                }
            }
        }
        Ok(())
    }
}

fn dir_is_empty(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
