//! Finding and reading source files.

use std::fs;
use std::path::{Path, PathBuf};

use qux_diagnostic::BuildError;
use qux_parse::SOURCE_EXTENSION;

use crate::config::Charset;

/// Expand `inputs` into the source files to build.
///
/// Directories are searched recursively for `*.qux` files, in sorted order;
/// hidden entries are skipped. Anything else is taken as given, so a missing
/// file surfaces later as a read error for that input. Repeated paths are
/// kept once, at their first position.
pub fn discover(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            discover_recursive(input, &mut found);
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    let mut seen = rustc_hash::FxHashSet::default();
    files.retain(|path| seen.insert(path.clone()));
    files
}

fn discover_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "cannot list directory");
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'))
        {
            continue;
        }
        if path.is_dir() {
            discover_recursive(&path, files);
        } else if path.extension().is_some_and(|e| e == SOURCE_EXTENSION) {
            files.push(path);
        }
    }
}

/// Read a source file in `charset`.
pub fn read_source(path: &Path, charset: Charset) -> Result<String, BuildError> {
    let bytes = fs::read(path).map_err(|e| BuildError::io("read", path, &e))?;
    charset
        .decode(bytes)
        .map_err(|reason| BuildError::new(format!("'{}' is not {charset}: {reason}", path.display())))
}

/// File name without its extension: the last segment of the unit id.
pub fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_discover_sorted_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/c")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        for file in ["b/c/Z.qux", "b/A.qux", "M.qux", "notes.txt", ".hidden/H.qux"] {
            fs::write(root.join(file), "").unwrap();
        }
        let explicit = root.join("elsewhere/Missing.qux");
        let found = discover(&[root.to_path_buf(), explicit.clone(), root.join("M.qux")]);
        assert_eq!(
            found,
            vec![
                root.join("M.qux"),
                root.join("b/A.qux"),
                root.join("b/c/Z.qux"),
                explicit,
            ]
        );
    }

    #[test]
    fn test_read_errors_are_build_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("Nope.qux");
        let err = read_source(&missing, Charset::Utf8).unwrap_err();
        assert!(err.to_string().starts_with("failed to read '"), "{err}");

        let latin = dir.path().join("Latin.qux");
        fs::write(&latin, [b'"', 0xE9, b'"']).unwrap();
        assert!(read_source(&latin, Charset::Utf8).is_err());
        assert_eq!(read_source(&latin, Charset::Latin1).unwrap(), "\"é\"");
    }

    #[test]
    fn test_stem() {
        assert_eq!(stem(Path::new("src/a/Main.qux")), "Main");
    }
}
