use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("failed to read file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to scan directory '{path}': {source}")]
    ScanError {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl IoError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DirectoryNotFound { path: path.into() }
    }

    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub fn scan_error(path: impl Into<PathBuf>, source: walkdir::Error) -> Self {
        Self::ScanError {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_display() {
        let err = IoError::file_not_found("/path/to/Suite.java");
        assert_eq!(err.to_string(), "file not found: /path/to/Suite.java");
    }

    #[test]
    fn test_directory_not_found_display() {
        let err = IoError::directory_not_found("/path/to/src/test/java");
        assert_eq!(err.to_string(), "directory not found: /path/to/src/test/java");
    }

    #[test]
    fn test_read_error_display() {
        let source = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let err = IoError::read_error("/locked/A.java", source);
        assert!(err
            .to_string()
            .starts_with("failed to read file '/locked/A.java'"));
    }
}
