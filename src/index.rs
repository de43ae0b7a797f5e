//! Sidecar index builder.
//!
//! Walks a search root, pairs every raw file with its sidecar sibling
//! and groups the matched sidecar paths by their containing directory.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{InputProblem, SidecarError, check_problems};

/// Parameters for a single search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Filename tail identifying raw files, for example `.CR2`.
    pub raw_suffix: String,
    /// Filename tail replacing the raw suffix to form the sidecar name, for example `.xmp`.
    pub sidecar_suffix: String,
    /// Require the sidecar modification time to equal the raw file modification time.
    pub check_time_coherence: bool,
    /// Do not descend into hidden directories or consider hidden files.
    pub skip_hidden: bool,
}

/// Counts gathered during one search.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    /// Files whose name ends with the raw suffix, matched or not.
    pub raw_files: u64,
    /// Raw files that produced a sidecar match.
    pub sidecar_files: u64,
    /// Sum of matched sidecar file sizes in bytes.
    pub total_size: u64,
}

/// Matched sidecar files grouped by the directory they live in.
///
/// Every path stored under a directory key has that directory as its parent.
/// Files within a directory keep the order they were discovered in.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SidecarIndex {
    root: PathBuf,
    groups: BTreeMap<PathBuf, Vec<PathBuf>>,
}

impl SearchOptions {
    #[must_use]
    pub fn new(raw_suffix: impl Into<String>, sidecar_suffix: impl Into<String>, check_time_coherence: bool) -> Self {
        Self {
            raw_suffix: raw_suffix.into(),
            sidecar_suffix: sidecar_suffix.into(),
            check_time_coherence,
            skip_hidden: false,
        }
    }

    #[must_use]
    pub fn skip_hidden(mut self, skip_hidden: bool) -> Self {
        self.skip_hidden = skip_hidden;
        self
    }

    /// Check the search preconditions, reporting every violated one.
    ///
    /// # Errors
    /// Returns [`SidecarError::Validation`] listing all problems found.
    pub fn validate(&self, search_root: &Path) -> Result<(), SidecarError> {
        let mut problems = Vec::new();
        if self.raw_suffix.is_empty() {
            problems.push(InputProblem::EmptyRawSuffix);
        }
        if self.sidecar_suffix.is_empty() {
            problems.push(InputProblem::EmptySidecarSuffix);
        }
        if !self.raw_suffix.is_empty() && self.raw_suffix.to_lowercase() == self.sidecar_suffix.to_lowercase() {
            problems.push(InputProblem::SameSuffixes {
                raw: self.raw_suffix.clone(),
                sidecar: self.sidecar_suffix.clone(),
            });
        }
        if !search_root.is_dir() {
            problems.push(InputProblem::SearchRootMissing(search_root.to_path_buf()));
        }
        check_problems(problems)
    }

    /// Check if a file name ends with the raw suffix.
    ///
    /// The comparison is on the raw name bytes, so names that are not valid Unicode still match.
    #[must_use]
    pub fn is_raw_name(&self, file_name: &OsStr) -> bool {
        !self.raw_suffix.is_empty() && file_name.as_encoded_bytes().ends_with(self.raw_suffix.as_bytes())
    }

    /// Compute the sidecar path for a raw file, if the name ends with the raw suffix.
    ///
    /// ```rust
    /// use std::path::{Path, PathBuf};
    /// use sidecar_dump::SearchOptions;
    ///
    /// let options = SearchOptions::new(".CR2", ".xmp", false);
    /// assert_eq!(
    ///     options.sidecar_path(Path::new("/data/IMG_0001.CR2")),
    ///     Some(PathBuf::from("/data/IMG_0001.xmp"))
    /// );
    /// assert_eq!(options.sidecar_path(Path::new("/data/IMG_0001.cr2")), None);
    /// ```
    #[must_use]
    pub fn sidecar_path(&self, raw_path: &Path) -> Option<PathBuf> {
        let name = raw_path.file_name()?;
        if !self.is_raw_name(name) {
            return None;
        }
        let base_len = name.as_encoded_bytes().len() - self.raw_suffix.len();
        let sidecar_name = replace_name_tail(name, base_len, &self.sidecar_suffix)?;
        Some(raw_path.with_file_name(sidecar_name))
    }
}

/// Keep the first `base_len` bytes of `name` and append `tail`.
#[cfg(unix)]
fn replace_name_tail(name: &OsStr, base_len: usize, tail: &str) -> Option<OsString> {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    let mut bytes = name.as_bytes().get(..base_len)?.to_vec();
    bytes.extend_from_slice(tail.as_bytes());
    Some(OsString::from_vec(bytes))
}

/// Keep the first `base_len` bytes of `name` and append `tail`.
///
/// Names that are not valid Unicode have no portable byte representation here and give `None`.
#[cfg(not(unix))]
fn replace_name_tail(name: &OsStr, base_len: usize, tail: &str) -> Option<OsString> {
    let base = name.to_str()?.get(..base_len)?;
    Some(OsString::from(format!("{base}{tail}")))
}

impl SidecarIndex {
    /// Walk `search_root` and index every sidecar matching a raw file.
    ///
    /// Entries are visited depth-first with directory contents sorted by file name.
    /// A missing or unreadable root, or a root that is not a directory, produces an empty index.
    /// Unreadable subdirectories are skipped.
    #[must_use]
    pub fn build(search_root: &Path, options: &SearchOptions) -> (Self, SearchStats) {
        let mut index = Self::new(search_root.to_path_buf());
        let mut stats = SearchStats::default();

        if options.raw_suffix.is_empty() || !search_root.is_dir() {
            return (index, stats);
        }

        let walker = WalkDir::new(search_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !(options.skip_hidden && entry.depth() > 0 && crate::is_hidden(entry)))
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file());

        for entry in walker {
            if !options.is_raw_name(entry.file_name()) {
                continue;
            }
            stats.raw_files += 1;

            let raw_path = entry.path();
            let Some(sidecar_path) = options.sidecar_path(raw_path) else {
                continue;
            };

            if let Some(size) = Self::matching_sidecar_size(raw_path, &sidecar_path, options) {
                stats.sidecar_files += 1;
                stats.total_size += size;
                index.insert(sidecar_path);
            }
        }

        (index, stats)
    }

    /// Create an empty index for the given search root.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self {
            root,
            groups: BTreeMap::new(),
        }
    }

    /// The search root this index was built from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of indexed sidecar files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Number of directories holding at least one indexed file.
    #[must_use]
    pub fn directory_count(&self) -> usize {
        self.groups.len()
    }

    /// Indexed files of a single directory in discovery order.
    #[must_use]
    pub fn get(&self, directory: &Path) -> Option<&[PathBuf]> {
        self.groups.get(directory).map(Vec::as_slice)
    }

    /// Iterate over directories and their indexed files.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[PathBuf])> {
        self.groups.iter().map(|(dir, files)| (dir.as_path(), files.as_slice()))
    }

    /// All indexed files as a flat list.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.groups.values().flatten().map(PathBuf::as_path)
    }

    /// Current size of the indexed files on disk.
    /// Files that can no longer be read count as zero.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files()
            .filter_map(|path| fs::metadata(path).ok())
            .map(|metadata| metadata.len())
            .sum()
    }

    /// Remove the first directory entry for processing.
    pub(crate) fn pop_first(&mut self) -> Option<(PathBuf, Vec<PathBuf>)> {
        self.groups.pop_first()
    }

    /// Put unprocessed files back under their directory.
    pub(crate) fn restore(&mut self, directory: PathBuf, files: Vec<PathBuf>) {
        if !files.is_empty() {
            self.groups.insert(directory, files);
        }
    }

    fn insert(&mut self, sidecar_path: PathBuf) {
        let directory = sidecar_path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.groups.entry(directory).or_default().push(sidecar_path);
    }

    /// Size of the sidecar file if it exists and passes the time check.
    fn matching_sidecar_size(raw_path: &Path, sidecar_path: &Path, options: &SearchOptions) -> Option<u64> {
        if sidecar_path == raw_path {
            return None;
        }
        let sidecar_metadata = fs::metadata(sidecar_path).ok().filter(Metadata::is_file)?;
        if options.check_time_coherence {
            let raw_metadata = fs::metadata(raw_path).ok()?;
            if !same_modified_time(&raw_metadata, &sidecar_metadata) {
                return None;
            }
        }
        Some(sidecar_metadata.len())
    }
}

/// Exact equality, no tolerance window.
fn same_modified_time(first: &Metadata, second: &Metadata) -> bool {
    match (first.modified(), second.modified()) {
        (Ok(first), Ok(second)) => first == second,
        _ => false,
    }
}

impl<'a> IntoIterator for &'a SidecarIndex {
    type Item = (&'a Path, &'a [PathBuf]);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
