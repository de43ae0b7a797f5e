use std::fmt::Write;
use std::path::PathBuf;

use thiserror::Error;

/// A single violated precondition of a search or a dump.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputProblem {
    #[error("raw file suffix is empty")]
    EmptyRawSuffix,

    #[error("sidecar file suffix is empty")]
    EmptySidecarSuffix,

    #[error("raw and sidecar suffixes are the same: '{raw}' and '{sidecar}'")]
    SameSuffixes { raw: String, sidecar: String },

    #[error("search directory does not exist: {}", .0.display())]
    SearchRootMissing(PathBuf),

    #[error("destination directory does not exist: {}", .0.display())]
    DestinationMissing(PathBuf),

    #[error("destination is not a directory: {}", .0.display())]
    DestinationNotDirectory(PathBuf),

    #[error("dump folder name is empty")]
    EmptyFolderName,

    #[error("dump folder name must be a single directory name: '{0}'")]
    InvalidFolderName(String),

    #[error("dump folder already exists: {}", .0.display())]
    DumpFolderExists(PathBuf),
}

#[derive(Error, Debug)]
pub enum SidecarError {
    /// Every violated precondition. Nothing was written to disk.
    #[error("{}", format_problems(.0))]
    Validation(Vec<InputProblem>),

    #[error("indexed directory is not inside the search root {}: {}", root.display(), directory.display())]
    OutsideRoot { root: PathBuf, directory: PathBuf },

    #[error("failed to create directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {} to {} ({moved} file(s) already moved)", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        moved: usize,
        #[source]
        source: std::io::Error,
    },
}

impl SidecarError {
    /// True if the error was raised before touching the filesystem.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The violated preconditions, empty for mid-relocation failures.
    #[must_use]
    pub fn problems(&self) -> &[InputProblem] {
        match self {
            Self::Validation(problems) => problems,
            _ => &[],
        }
    }
}

/// Convert collected problems into a result.
pub(crate) fn check_problems(problems: Vec<InputProblem>) -> Result<(), SidecarError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(SidecarError::Validation(problems))
    }
}

fn format_problems(problems: &[InputProblem]) -> String {
    let mut message = String::from("invalid input:");
    for problem in problems {
        let _ = write!(message, "\n  - {problem}");
    }
    message
}
