use std::ffi::OsStr;
use std::fs::Metadata;

/// The kind of a traversed entry.
///
/// Classification follows symlinks, so a link counts as whatever it points
/// at; a broken link fails the metadata query instead and is skipped there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    /// A regular file, evaluated against the filter.
    File,

    /// A directory, scanned recursively.
    Dir,

    /// Anything else (device files, pipes, sockets). Skipped.
    Other,
}

impl EntryKind {
    pub(crate) fn of(meta: &Metadata) -> Self {
        if meta.is_dir() {
            EntryKind::Dir
        } else if meta.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// Whether an entry name is hidden (leading dot).
///
/// Hidden entries are never visited, never deleted, and never reported.
pub(crate) fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_names_are_hidden() {
        assert!(is_hidden(OsStr::new(".DS_Store")));
        assert!(is_hidden(OsStr::new(".cache")));
        assert!(is_hidden(OsStr::new(".")));
    }

    #[test]
    fn plain_names_are_not_hidden() {
        assert!(!is_hidden(OsStr::new("scan.dcm")));
        assert!(!is_hidden(OsStr::new("series.1.2.dcm")));
        assert!(!is_hidden(OsStr::new("sub")));
    }
}
