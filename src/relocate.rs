//! Relocation engine.
//!
//! Moves every indexed sidecar file into `destination/folder_name`, recreating
//! the directory layout relative to the search root. The index is drained
//! directory by directory; after a failure it still holds everything that was
//! not moved.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{InputProblem, SidecarError, check_problems};
use crate::index::SidecarIndex;

/// Where the indexed files get dumped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpTarget {
    /// Existing directory that will hold the dump folder.
    pub destination_root: PathBuf,
    /// Name of the dump folder created under the destination root.
    pub folder_name: String,
}

/// A single planned or performed file move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveInfo {
    pub source: PathBuf,
    pub target: PathBuf,
}

/// Summary of a completed relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationReport {
    /// The created dump folder.
    pub dump_root: PathBuf,
    /// Number of files moved.
    pub moved_files: usize,
    /// Number of source directories processed.
    pub directories: usize,
}

impl DumpTarget {
    #[must_use]
    pub fn new(destination_root: impl Into<PathBuf>, folder_name: impl Into<String>) -> Self {
        Self {
            destination_root: destination_root.into(),
            folder_name: folder_name.into(),
        }
    }

    /// Full path of the dump folder.
    #[must_use]
    pub fn dump_root(&self) -> PathBuf {
        self.destination_root.join(&self.folder_name)
    }

    /// Check the dump preconditions, reporting every violated one.
    ///
    /// # Errors
    /// Returns [`SidecarError::Validation`] listing all problems found.
    pub fn validate(&self) -> Result<(), SidecarError> {
        let mut problems = Vec::new();

        let destination_is_dir = match fs::metadata(&self.destination_root) {
            Ok(metadata) if metadata.is_dir() => true,
            Ok(_) => {
                problems.push(InputProblem::DestinationNotDirectory(self.destination_root.clone()));
                false
            }
            Err(_) => {
                problems.push(InputProblem::DestinationMissing(self.destination_root.clone()));
                false
            }
        };

        let name_is_valid = if self.folder_name.is_empty() {
            problems.push(InputProblem::EmptyFolderName);
            false
        } else if self.folder_name.contains(['/', '\\']) || self.folder_name == "." || self.folder_name == ".." {
            problems.push(InputProblem::InvalidFolderName(self.folder_name.clone()));
            false
        } else {
            true
        };

        if destination_is_dir && name_is_valid {
            let dump_root = self.dump_root();
            // Broken symlinks count as existing
            if fs::symlink_metadata(&dump_root).is_ok() {
                problems.push(InputProblem::DumpFolderExists(dump_root));
            }
        }

        check_problems(problems)
    }
}

impl MoveInfo {
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }
}

impl SidecarIndex {
    /// Destination directory for an indexed directory under the given dump root.
    ///
    /// # Errors
    /// Returns [`SidecarError::OutsideRoot`] if the directory is not under the search root.
    pub fn destination_dir(&self, directory: &Path, dump_root: &Path) -> Result<PathBuf, SidecarError> {
        directory
            .strip_prefix(self.root())
            .map(|relative| dump_root.join(relative))
            .map_err(|_| SidecarError::OutsideRoot {
                root: self.root().to_path_buf(),
                directory: directory.to_path_buf(),
            })
    }

    /// List the moves a relocation into `dump_root` would perform.
    ///
    /// # Errors
    /// Returns [`SidecarError::OutsideRoot`] if an indexed directory is not under the search root.
    pub fn planned_moves(&self, dump_root: &Path) -> Result<Vec<MoveInfo>, SidecarError> {
        let mut moves = Vec::with_capacity(self.len());
        for (directory, files) in self {
            let destination = self.destination_dir(directory, dump_root)?;
            moves.extend(
                files
                    .iter()
                    .map(|file| MoveInfo::new(file.clone(), destination.join(file.file_name().unwrap_or_default()))),
            );
        }
        Ok(moves)
    }
}

/// Move every indexed file into the dump folder and drain the index.
///
/// # Errors
/// Validation failures are returned before anything is written.
/// Failures after that leave already moved files in place and the
/// remaining ones in the index.
pub fn relocate(index: &mut SidecarIndex, target: &DumpTarget) -> Result<RelocationReport, SidecarError> {
    relocate_with(index, target, |_| {})
}

/// Like [`relocate`], calling `on_move` after each successfully moved file.
///
/// # Errors
/// See [`relocate`].
pub fn relocate_with<F>(
    index: &mut SidecarIndex,
    target: &DumpTarget,
    mut on_move: F,
) -> Result<RelocationReport, SidecarError>
where
    F: FnMut(&MoveInfo),
{
    target.validate()?;

    let dump_root = target.dump_root();
    fs::create_dir(&dump_root).map_err(|source| SidecarError::CreateDir {
        path: dump_root.clone(),
        source,
    })?;

    let mut report = RelocationReport {
        dump_root,
        moved_files: 0,
        directories: 0,
    };

    while let Some((directory, files)) = index.pop_first() {
        let destination = match index.destination_dir(&directory, &report.dump_root) {
            Ok(destination) => destination,
            Err(error) => {
                index.restore(directory, files);
                return Err(error);
            }
        };

        if let Err(source) = fs::create_dir_all(&destination) {
            index.restore(directory, files);
            return Err(SidecarError::CreateDir {
                path: destination,
                source,
            });
        }

        let mut remaining = files.into_iter();
        while let Some(file) = remaining.next() {
            let target_path = destination.join(file.file_name().unwrap_or_default());
            if let Err(source) = move_file(&file, &target_path) {
                let unmoved: Vec<PathBuf> = std::iter::once(file.clone()).chain(remaining).collect();
                index.restore(directory, unmoved);
                return Err(SidecarError::Move {
                    from: file,
                    to: target_path,
                    moved: report.moved_files,
                    source,
                });
            }
            report.moved_files += 1;
            on_move(&MoveInfo::new(file, target_path));
        }

        report.directories += 1;
    }

    Ok(report)
}

/// Rename a single file, refusing to replace an existing target.
fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    if fs::symlink_metadata(target).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("target already exists: {}", target.display()),
        ));
    }
    fs::rename(source, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::File;

    use tempfile::TempDir;

    use crate::index::SearchOptions;

    fn create_test_dir() -> TempDir {
        tempfile::tempdir().expect("Failed to create temp dir")
    }

    fn create_file(dir: &Path, name: &str) -> PathBuf {
        fs::create_dir_all(dir).expect("Failed to create dir");
        let path = dir.join(name);
        File::create(&path).expect("Failed to create file");
        path
    }

    fn build_index(root: &Path) -> SidecarIndex {
        SidecarIndex::build(root, &SearchOptions::new(".RAW", ".XMP", false)).0
    }

    #[test]
    fn relocates_files_preserving_structure() {
        let data = create_test_dir();
        let out = create_test_dir();
        let root = data.path();
        create_file(&root.join("a"), "img1.RAW");
        let sidecar = create_file(&root.join("a"), "img1.XMP");
        create_file(&root.join("b"), "img2.RAW");

        let mut index = build_index(root);
        let report = relocate(&mut index, &DumpTarget::new(out.path(), "dump")).expect("should relocate");

        let moved = out.path().join("dump").join("a").join("img1.XMP");
        assert!(moved.is_file());
        assert!(!sidecar.exists());
        assert!(root.join("a").is_dir());
        assert!(root.join("a").join("img1.RAW").is_file());
        assert!(index.is_empty());
        assert_eq!(index.total_size(), 0);
        assert_eq!(report.moved_files, 1);
        assert_eq!(report.directories, 1);
        assert_eq!(report.dump_root, out.path().join("dump"));
    }

    #[test]
    fn files_in_search_root_go_to_dump_root() {
        let data = create_test_dir();
        let out = create_test_dir();
        create_file(data.path(), "top.RAW");
        create_file(data.path(), "top.XMP");
        create_file(&data.path().join("x/y/z"), "deep.RAW");
        create_file(&data.path().join("x/y/z"), "deep.XMP");

        let mut index = build_index(data.path());
        let report = relocate(&mut index, &DumpTarget::new(out.path(), "dump")).expect("should relocate");

        assert!(out.path().join("dump/top.XMP").is_file());
        assert!(out.path().join("dump/x/y/z/deep.XMP").is_file());
        assert_eq!(report.moved_files, 2);
        assert_eq!(report.directories, 2);
    }

    #[test]
    fn existing_dump_folder_fails_without_mutation() {
        let data = create_test_dir();
        let out = create_test_dir();
        create_file(data.path(), "img.RAW");
        let sidecar = create_file(data.path(), "img.XMP");
        fs::create_dir(out.path().join("dump")).expect("Failed to create dir");

        let mut index = build_index(data.path());
        let error = relocate(&mut index, &DumpTarget::new(out.path(), "dump")).expect_err("should fail");

        assert!(error.is_validation());
        assert_eq!(
            error.problems(),
            &[InputProblem::DumpFolderExists(out.path().join("dump"))]
        );
        assert!(sidecar.is_file());
        assert_eq!(index.len(), 1);
        assert!(!out.path().join("dump").join("img.XMP").exists());
    }

    #[test]
    fn validation_reports_all_problems() {
        let out = create_test_dir();
        let missing = out.path().join("missing");

        let error = DumpTarget::new(&missing, "").validate().expect_err("should fail");

        assert_eq!(
            error.problems(),
            &[InputProblem::DestinationMissing(missing), InputProblem::EmptyFolderName]
        );
    }

    #[test]
    fn validation_rejects_file_destination_and_nested_name() {
        let out = create_test_dir();
        let file = create_file(out.path(), "not-a-dir");

        let error = DumpTarget::new(&file, "a/b").validate().expect_err("should fail");

        assert_eq!(
            error.problems(),
            &[
                InputProblem::DestinationNotDirectory(file),
                InputProblem::InvalidFolderName("a/b".to_string()),
            ]
        );
    }

    #[test]
    fn validation_accepts_new_folder() {
        let out = create_test_dir();
        assert!(DumpTarget::new(out.path(), "dump").validate().is_ok());
    }

    #[test]
    fn failure_mid_relocation_keeps_unmoved_files_in_index() {
        let data = create_test_dir();
        let out = create_test_dir();
        let root = data.path();
        create_file(&root.join("a"), "one.RAW");
        create_file(&root.join("a"), "one.XMP");
        create_file(&root.join("b"), "two.RAW");
        let vanished = create_file(&root.join("b"), "two.XMP");
        create_file(&root.join("b"), "three.RAW");
        let moved_first = create_file(&root.join("b"), "three.XMP");
        create_file(&root.join("c"), "four.RAW");
        create_file(&root.join("c"), "four.XMP");

        let mut index = build_index(root);
        fs::remove_file(&vanished).expect("Failed to remove file");

        let error = relocate(&mut index, &DumpTarget::new(out.path(), "dump")).expect_err("should fail");

        // "b" is sorted as three.XMP, two.XMP so the first file moves before the failure
        match error {
            SidecarError::Move { from, moved, .. } => {
                assert_eq!(from, vanished);
                assert_eq!(moved, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(out.path().join("dump/a/one.XMP").is_file());
        assert!(out.path().join("dump/b/three.XMP").is_file());
        assert!(!moved_first.exists());
        assert_eq!(index.get(&root.join("a")), None);
        assert_eq!(index.get(&root.join("b")), Some([vanished].as_slice()));
        assert_eq!(index.get(&root.join("c")).map(<[PathBuf]>::len), Some(1));
    }

    #[test]
    fn planned_moves_mirror_relative_paths() {
        let data = create_test_dir();
        let root = data.path();
        let first = create_file(&root.join("2024/01"), "img.XMP");
        create_file(&root.join("2024/01"), "img.RAW");

        let index = build_index(root);
        let moves = index.planned_moves(Path::new("/out/dump")).expect("should plan");

        assert_eq!(
            moves,
            vec![MoveInfo::new(first, PathBuf::from("/out/dump/2024/01/img.XMP"))]
        );
    }

    #[test]
    fn directory_outside_root_is_rejected() {
        let index = SidecarIndex::new(PathBuf::from("/data"));
        let result = index.destination_dir(Path::new("/elsewhere/a"), Path::new("/out/dump"));
        assert!(matches!(result, Err(SidecarError::OutsideRoot { .. })));
    }

    #[test]
    fn relocate_with_reports_each_move() {
        let data = create_test_dir();
        let out = create_test_dir();
        create_file(data.path(), "a.RAW");
        create_file(data.path(), "a.XMP");
        create_file(data.path(), "b.RAW");
        create_file(data.path(), "b.XMP");

        let mut index = build_index(data.path());
        let mut seen = Vec::new();
        relocate_with(&mut index, &DumpTarget::new(out.path(), "dump"), |info| {
            seen.push(crate::path_to_filename_string(&info.target));
        })
        .expect("should relocate");

        assert_eq!(seen, vec!["a.XMP", "b.XMP"]);
    }

    #[test]
    fn move_file_refuses_to_overwrite() {
        let dir = create_test_dir();
        let source = create_file(dir.path(), "source.XMP");
        let target = create_file(dir.path(), "target.XMP");

        let error = move_file(&source, &target).expect_err("should refuse");

        assert_eq!(error.kind(), io::ErrorKind::AlreadyExists);
        assert!(source.exists());
    }
}
