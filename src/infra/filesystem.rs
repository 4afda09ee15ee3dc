//! Filesystem operations
//!
//! Handles file and directory operations for configuration layers and
//! template rendering.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Write content to a file, creating parent directories
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read a file that may legitimately be absent
pub fn read_optional(path: &Path) -> Result<Option<String>, FilesystemError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FilesystemError::ReadFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        }),
    }
}

/// Copy a file byte for byte, keeping its permissions
pub fn copy_file(src: &Path, dest: &Path) -> Result<(), FilesystemError> {
    if let Some(parent) = dest.parent() {
        create_dir_all(parent)?;
    }
    std::fs::copy(src, dest)
        .map(|_| ())
        .map_err(|e| FilesystemError::CopyFile {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
            error: e.to_string(),
        })
}

/// Write `content` to `dest` with the permissions of `src`
pub fn write_like(src: &Path, dest: &Path, content: &str) -> Result<(), FilesystemError> {
    write_file(dest, content)?;
    let permissions = std::fs::metadata(src)
        .map_err(|e| FilesystemError::ReadFile {
            path: src.to_path_buf(),
            error: e.to_string(),
        })?
        .permissions();
    std::fs::set_permissions(dest, permissions).map_err(|e| FilesystemError::WriteFile {
        path: dest.to_path_buf(),
        error: e.to_string(),
    })
}

/// Regular files under `root`, as paths relative to it, in sorted order
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>, FilesystemError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| FilesystemError::Walk {
            path: root.to_path_buf(),
            error: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}
