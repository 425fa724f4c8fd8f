use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("failed to read suite file '{path}': {message}")]
    ReadError { path: PathBuf, message: String },

    #[error("failed to parse suite file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("unsupported suite format: {format} (expected xml, yaml or json)")]
    UnsupportedFormat { format: String },

    #[error("suite file '{path}' defines no suites")]
    Empty { path: PathBuf },
}

impl SuiteError {
    pub fn read_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ReadError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self::Empty { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_display() {
        let err = SuiteError::read_error("testng.yaml", "file not found");
        assert_eq!(
            err.to_string(),
            "failed to read suite file 'testng.yaml': file not found"
        );
    }

    #[test]
    fn test_unsupported_format_display() {
        let err = SuiteError::unsupported_format("toml");
        assert_eq!(
            err.to_string(),
            "unsupported suite format: toml (expected xml, yaml or json)"
        );
    }
}
