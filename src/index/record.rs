//! Path decomposition into index records

use std::path::Path;

/// One file path ready to be staged
///
/// Components that cannot be derived are `None`, never an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Raw path bytes; the identity used for deduplication
    pub path_key: Vec<u8>,
    /// Display form of the path, never empty. Lossy for names that are not
    /// valid UTF-8, so two distinct paths may share it.
    pub full_path: String,
    pub file_name: Option<String>,
    /// Including the leading dot, e.g. `.txt`
    pub extension: Option<String>,
    pub directory_path: Option<String>,
}

impl FileRecord {
    /// Decompose a path; `None` only for an empty path
    pub fn from_path(path: &Path) -> Option<Self> {
        let full_path = path.to_string_lossy().into_owned();
        if full_path.is_empty() {
            return None;
        }

        let file_name = file_name(path);
        let extension = file_name.as_deref().and_then(extension);
        let directory_path = directory_path(path);

        Some(Self {
            path_key: path.as_os_str().as_encoded_bytes().to_vec(),
            full_path,
            file_name,
            extension,
            directory_path,
        })
    }

    pub fn decompose(full_path: &str) -> Option<Self> {
        Self::from_path(Path::new(full_path))
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .and_then(non_empty)
}

/// Everything from the last dot of the name; a trailing dot has none.
/// Dot-files count as all extension (`.gitignore`).
fn extension(name: &str) -> Option<String> {
    let idx = name.rfind('.')?;
    if idx + 1 == name.len() {
        return None;
    }
    Some(name[idx..].to_string())
}

fn directory_path(path: &Path) -> Option<String> {
    path.parent()
        .map(|dir| dir.to_string_lossy().into_owned())
        .and_then(non_empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_file() {
        let rec = FileRecord::decompose("/a/b/2.log").unwrap();
        assert_eq!(rec.full_path, "/a/b/2.log");
        assert_eq!(rec.file_name.as_deref(), Some("2.log"));
        assert_eq!(rec.extension.as_deref(), Some(".log"));
        assert_eq!(rec.directory_path.as_deref(), Some("/a/b"));
    }

    #[test]
    fn test_multiple_dots_keep_last() {
        let rec = FileRecord::decompose("/data/archive.tar.GZ").unwrap();
        assert_eq!(rec.extension.as_deref(), Some(".GZ"));
    }

    #[test]
    fn test_no_extension_is_absent() {
        let rec = FileRecord::decompose("/usr/bin/make").unwrap();
        assert_eq!(rec.file_name.as_deref(), Some("make"));
        assert_eq!(rec.extension, None);
    }

    #[test]
    fn test_trailing_dot_is_absent() {
        let rec = FileRecord::decompose("/tmp/odd.").unwrap();
        assert_eq!(rec.file_name.as_deref(), Some("odd."));
        assert_eq!(rec.extension, None);
    }

    #[test]
    fn test_dot_file() {
        let rec = FileRecord::decompose("/home/me/.gitignore").unwrap();
        assert_eq!(rec.file_name.as_deref(), Some(".gitignore"));
        assert_eq!(rec.extension.as_deref(), Some(".gitignore"));
    }

    #[test]
    fn test_file_at_filesystem_root() {
        let rec = FileRecord::decompose("/1.txt").unwrap();
        assert_eq!(rec.directory_path.as_deref(), Some("/"));
    }

    #[test]
    fn test_bare_name_has_no_directory() {
        let rec = FileRecord::decompose("notes.md").unwrap();
        assert_eq!(rec.directory_path, None);
        assert_eq!(rec.extension.as_deref(), Some(".md"));
    }

    #[test]
    fn test_root_only_keeps_full_path() {
        let rec = FileRecord::decompose("/").unwrap();
        assert_eq!(rec.full_path, "/");
        assert_eq!(rec.file_name, None);
        assert_eq!(rec.extension, None);
        assert_eq!(rec.directory_path, None);
    }

    #[test]
    fn test_empty_path_rejected() {
        assert!(FileRecord::decompose("").is_none());
    }

    #[test]
    fn test_utf8_key_matches_text() {
        let rec = FileRecord::decompose("/a/ünï.txt").unwrap();
        assert_eq!(rec.path_key, "/a/ünï.txt".as_bytes());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_keep_distinct_keys() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let first = FileRecord::from_path(Path::new(OsStr::from_bytes(b"/t/a\xff.txt"))).unwrap();
        let second = FileRecord::from_path(Path::new(OsStr::from_bytes(b"/t/a\xfe.txt"))).unwrap();

        // Both render to the same replacement text
        assert_eq!(first.full_path, second.full_path);
        assert_eq!(first.full_path, "/t/a\u{fffd}.txt");
        assert_eq!(first.extension.as_deref(), Some(".txt"));

        assert_ne!(first.path_key, second.path_key);
        assert_eq!(first.path_key, b"/t/a\xff.txt");
    }
}
