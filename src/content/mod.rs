//! Content root sandboxing and file-type dispatch.

use std::path::{Component, Path, PathBuf};

use crate::error::AppError;

/// Extensions expanded by the template engine and served as plain text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "log"];

/// How a file is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Parsed and re-served as `application/json`, bypassing the engine
    Json,
    /// Expanded by the template engine, served as plain text
    Text,
    /// Served verbatim as `application/octet-stream`
    Binary,
}

impl FileKind {
    /// Classify a file by its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("json") => FileKind::Json,
            Some(ext) if TEXT_EXTENSIONS.contains(&ext) => FileKind::Text,
            _ => FileKind::Binary,
        }
    }

    /// Label used in metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Json => "json",
            FileKind::Text => "text",
            FileKind::Binary => "binary",
        }
    }
}

/// Resolve a requested path inside the content root.
///
/// Rejects absolute paths and any `..` component before touching the
/// filesystem, then canonicalizes and verifies the result is still under
/// the root and names a regular file. Traversal attempts map to 403, a
/// missing file to 404.
pub fn sandbox_path(root: &Path, requested: &str) -> Result<PathBuf, AppError> {
    let relative = Path::new(requested);

    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(AppError::Forbidden("Access denied".to_string())),
        }
    }

    let root = root
        .canonicalize()
        .map_err(|_| AppError::NotFound("File not found".to_string()))?;
    let resolved = root
        .join(relative)
        .canonicalize()
        .map_err(|_| AppError::NotFound("File not found".to_string()))?;

    // Symlinks may still point outside the root after canonicalization.
    if !resolved.starts_with(&root) {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    if !resolved.is_file() {
        return Err(AppError::NotFound("File not found".to_string()));
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_file_kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("a/b.json")), FileKind::Json);
        assert_eq!(FileKind::from_path(Path::new("a/b.txt")), FileKind::Text);
        assert_eq!(FileKind::from_path(Path::new("a/b.md")), FileKind::Text);
        assert_eq!(FileKind::from_path(Path::new("a/b.log")), FileKind::Text);
        assert_eq!(FileKind::from_path(Path::new("a/b.png")), FileKind::Binary);
        assert_eq!(FileKind::from_path(Path::new("no-extension")), FileKind::Binary);
    }

    #[test]
    fn test_file_kind_is_case_insensitive() {
        assert_eq!(FileKind::from_path(Path::new("B.TXT")), FileKind::Text);
        assert_eq!(FileKind::from_path(Path::new("B.Json")), FileKind::Json);
    }

    #[test]
    fn test_sandbox_allows_files_under_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/note.txt"), "hi").unwrap();

        let resolved = sandbox_path(dir.path(), "sub/note.txt").unwrap();
        assert!(resolved.ends_with("sub/note.txt"));
    }

    #[test]
    fn test_sandbox_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("note.txt"), "hi").unwrap();

        assert!(matches!(
            sandbox_path(dir.path(), "../note.txt"),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            sandbox_path(dir.path(), "sub/../../note.txt"),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_sandbox_rejects_absolute_paths() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            sandbox_path(dir.path(), "/etc/hostname"),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_sandbox_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            sandbox_path(dir.path(), "missing.txt"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_sandbox_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        assert!(matches!(
            sandbox_path(dir.path(), "sub"),
            Err(AppError::NotFound(_))
        ));
    }
}
