use serde::{Deserialize, Serialize};

/// File mode recorded for a path in a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileMode {
    /// Normal file (0o100644).
    Regular,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000).
    Symlink,
    /// Directory (0o040000). Only used for collapsed untracked or ignored
    /// directory entries.
    Directory,
    /// Submodule link (0o160000).
    Submodule,
}

impl FileMode {
    /// Octal mode value.
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
            Self::Submodule => 0o160000,
        }
    }

    /// Whether a change from `self` to `other` is a type change rather than
    /// a plain modification. Flipping the executable bit is a modification.
    pub fn is_type_change(&self, other: FileMode) -> bool {
        self.object_type() != other.object_type()
    }

    pub fn is_submodule(&self) -> bool {
        matches!(self, Self::Submodule)
    }

    fn object_type(&self) -> u8 {
        match self {
            Self::Regular | Self::Executable => 0,
            Self::Symlink => 1,
            Self::Directory => 2,
            Self::Submodule => 3,
        }
    }
}

impl std::fmt::Display for FileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executable_bit_is_not_a_type_change() {
        assert!(!FileMode::Regular.is_type_change(FileMode::Executable));
        assert!(FileMode::Regular.is_type_change(FileMode::Symlink));
        assert!(FileMode::Symlink.is_type_change(FileMode::Submodule));
    }

    #[test]
    fn mode_bits_are_distinct() {
        let bits: std::collections::HashSet<_> = [
            FileMode::Regular,
            FileMode::Executable,
            FileMode::Symlink,
            FileMode::Directory,
            FileMode::Submodule,
        ]
        .iter()
        .map(FileMode::mode_bits)
        .collect();
        assert_eq!(bits.len(), 5);
    }

    #[test]
    fn display_is_six_octal_digits() {
        assert_eq!(FileMode::Regular.to_string(), "100644");
        assert_eq!(FileMode::Directory.to_string(), "040000");
    }
}
