use std::path::Path;

use crate::path_to_string;

/// Character rules applied to a search path to turn it into a folder name.
#[derive(Debug, Clone, Copy)]
pub struct FolderNameRules {
    /// Characters dropped from the name.
    pub strip: &'static [char],
    /// Characters replaced with an underscore.
    pub underscore: &'static [char],
}

/// Drive colons are dropped and path separators become underscores.
pub const DEFAULT_RULES: FolderNameRules = FolderNameRules {
    strip: &[':'],
    underscore: &['/', '\\'],
};

impl FolderNameRules {
    /// Apply the rules left to right, one character at a time.
    #[must_use]
    pub fn apply(&self, input: &str) -> String {
        input
            .chars()
            .filter(|c| !self.strip.contains(c))
            .map(|c| if self.underscore.contains(&c) { '_' } else { c })
            .collect()
    }
}

/// Derive the default dump folder name from a search root.
///
/// ```rust
/// use std::path::Path;
/// use sidecar_dump::derive_folder_name;
///
/// assert_eq!(derive_folder_name(Path::new("/data/photos")), "_data_photos");
/// ```
#[must_use]
pub fn derive_folder_name(search_root: &Path) -> String {
    DEFAULT_RULES.apply(&path_to_string(search_root))
}
