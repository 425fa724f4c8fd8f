use thiserror::Error;

use crate::model::ReturnShape;

/// Why a data provider could not produce its rows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("cannot construct {class}: {reason}")]
    Construction { class: String, reason: String },

    #[error("cannot access provider {provider}: {reason}")]
    Access { provider: String, reason: String },

    #[error("provider {provider} threw {exception}")]
    ProviderThrew { provider: String, exception: String },

    #[error("provider {provider} cannot be evaluated: {reason}")]
    NotEvaluable { provider: String, reason: String },

    #[error("provider {provider} declared {expected} but returned {found}")]
    ShapeMismatch {
        provider: String,
        expected: ReturnShape,
        found: ReturnShape,
    },

    #[error("source of provider {provider} is unavailable: {reason}")]
    SourceUnavailable { provider: String, reason: String },

    #[error("no invocation target registered for provider {provider}")]
    NotRegistered { provider: String },
}

impl InvocationError {
    pub fn construction(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Construction {
            class: class.into(),
            reason: reason.into(),
        }
    }

    pub fn access(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Access {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn provider_threw(provider: impl Into<String>, exception: impl Into<String>) -> Self {
        Self::ProviderThrew {
            provider: provider.into(),
            exception: exception.into(),
        }
    }

    pub fn not_evaluable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotEvaluable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn source_unavailable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn not_registered(provider: impl Into<String>) -> Self {
        Self::NotRegistered {
            provider: provider.into(),
        }
    }

    /// Short machine-readable tag for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Construction { .. } => "construction",
            Self::Access { .. } => "access",
            Self::ProviderThrew { .. } => "provider_threw",
            Self::NotEvaluable { .. } => "not_evaluable",
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::NotRegistered { .. } => "not_registered",
        }
    }
}
