//! The catalog of test descriptors, grouped by folder.
//!
//! Descriptors live in `<root>/<group>/<test>.txt`. Both levels are read in
//! sorted order and entries starting with a dot are ignored.

mod builtin;

pub use builtin::BuiltinDescriptors;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::DESCRIPTOR_EXTENSION;
use crate::descriptor::{self, DescriptorError, TestDescriptor};

/// Errors raised while building the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Descriptor root {} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("Test `{test}` is defined twice in group `{group}`")]
    DuplicateTest { group: String, test: String },
}

impl CatalogError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }
}

/// What to do with a descriptor that does not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Fail the whole load.
    #[default]
    Abort,
    /// Log a warning and leave the descriptor out.
    Skip,
}

/// Descriptors that do not come from the descriptor folder.
pub trait SupplementalSource {
    /// Groups and their descriptors, in the order they should be appended.
    fn groups(&self) -> Vec<(String, Vec<TestDescriptor>)>;
}

/// Group name to descriptors, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    groups: BTreeMap<String, Vec<TestDescriptor>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every group folder below `root`.
    pub fn load(root: &Path, policy: LoadPolicy) -> Result<Self, CatalogError> {
        if !root.is_dir() {
            return Err(CatalogError::NotADirectory(root.to_path_buf()));
        }

        let mut catalog = Self::new();
        for group_dir in sorted_entries(root)? {
            if !group_dir.is_dir() {
                log::debug!("Ignoring {} outside of a group folder", group_dir.display());
                continue;
            }
            let Some(group) = file_name(&group_dir) else {
                continue;
            };

            for file in sorted_entries(&group_dir)? {
                if !file.is_file() {
                    continue;
                }
                let Some(test) = test_name(&file) else {
                    continue;
                };

                let text = std::fs::read_to_string(&file).map_err(|e| CatalogError::io(&file, e))?;
                match descriptor::parse(&test, &text, &file) {
                    Ok(parsed) => catalog.insert(&group, parsed)?,
                    Err(err) if policy == LoadPolicy::Skip => {
                        log::warn!("Skipping malformed descriptor: {}", err);
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }

        log::info!(
            "Loaded {} descriptors in {} groups from {}",
            catalog.len(),
            catalog.groups.len(),
            root.display()
        );
        Ok(catalog)
    }

    /// Adds a descriptor to a group, creating the group if needed.
    pub fn insert(&mut self, group: &str, descriptor: TestDescriptor) -> Result<(), CatalogError> {
        let tests = self.groups.entry(group.to_string()).or_default();
        if tests.iter().any(|t| t.name == descriptor.name) {
            return Err(CatalogError::DuplicateTest {
                group: group.to_string(),
                test: descriptor.name,
            });
        }
        tests.push(descriptor);
        Ok(())
    }

    /// Appends the descriptors of `source`. Existing groups are extended.
    pub fn merge(&mut self, source: &dyn SupplementalSource) -> Result<(), CatalogError> {
        for (group, descriptors) in source.groups() {
            for descriptor in descriptors {
                self.insert(&group, descriptor)?;
            }
        }
        Ok(())
    }

    /// Groups in name order with their tests in load order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[TestDescriptor])> {
        self.groups
            .iter()
            .map(|(name, tests)| (name.as_str(), tests.as_slice()))
    }

    pub fn group(&self, name: &str) -> Option<&[TestDescriptor]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    /// Looks up one test.
    pub fn find(&self, group: &str, test: &str) -> Option<&TestDescriptor> {
        self.group(group)?.iter().find(|t| t.name == test)
    }

    /// Total number of descriptors.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Directory entries sorted by name, without dot entries.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| CatalogError::io(dir, e))? {
        let entry = entry.map_err(|e| CatalogError::io(dir, e))?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

/// The file name without a trailing `.txt`.
fn test_name(path: &Path) -> Option<String> {
    let name = file_name(path)?;
    let suffix = format!(".{}", DESCRIPTOR_EXTENSION);
    Some(match name.strip_suffix(&suffix) {
        Some(stem) => stem.to_string(),
        None => name,
    })
}
