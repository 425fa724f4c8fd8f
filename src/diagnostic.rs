use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::model::ClassRef;

/// A recoverable problem met while building a census.
///
/// Nothing here aborts a count: every variant is collected and reported
/// next to the totals it affected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A file or directory could not be read or parsed.
    Discovery {
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
        message: String,
    },
    /// A suite document names a class no source root declares.
    ClassNotFound { class: String, suite: String },
    /// A test names a provider that does not exist in the searched class.
    ProviderNotFound {
        test: String,
        provider: String,
        search_class: ClassRef,
    },
    /// A provider was found but calling it failed.
    InvocationFailed {
        test: String,
        provider: String,
        reason: String,
        message: String,
    },
}

impl Diagnostic {
    pub fn discovery(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self::Discovery {
            path,
            message: message.into(),
        }
    }

    pub fn is_discovery(&self) -> bool {
        matches!(self, Self::Discovery { .. } | Self::ClassNotFound { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery {
                path: Some(path),
                message,
            } => write!(f, "{}: {message}", path.display()),
            Self::Discovery { path: None, message } => f.write_str(message),
            Self::ClassNotFound { class, suite } => {
                write!(f, "suite '{suite}' references unknown class {class}")
            }
            Self::ProviderNotFound {
                test,
                provider,
                search_class,
            } => write!(
                f,
                "{test}: data provider '{provider}' not found in {search_class}"
            ),
            Self::InvocationFailed { test, message, .. } => write!(f, "{test}: {message}"),
        }
    }
}
