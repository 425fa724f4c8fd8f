//! Invocation of data providers.
//!
//! The census never constructs objects or calls methods itself. It asks a
//! [`ProviderInvoker`] for the value a provider returns and measures that.
//!
//! - [`SourceInvoker`]: evaluates provider bodies straight from Java source
//! - [`RegistryInvoker`]: closures registered in-process, keyed by provider

mod registry;
pub mod source;

pub use registry::RegistryInvoker;
pub use source::SourceInvoker;

use crate::error::InvocationError;
use crate::model::{ProviderDescriptor, ReturnShape};

/// Arguments of one test case, as source text.
pub type Row = Vec<String>;

/// Value returned by a data provider.
pub enum ProviderOutput {
    /// Eagerly materialised rows (`Object[][]`).
    Table(Vec<Row>),
    /// An `Object[][]` known only by its length, such as `new Object[n][]`.
    Blank(usize),
    /// Single-pass rows (`Iterator<Object[]>`). Draining consumes it.
    Sequence(Box<dyn Iterator<Item = Row>>),
}

impl ProviderOutput {
    pub fn sequence<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Row>,
        I::IntoIter: 'static,
    {
        Self::Sequence(Box::new(rows.into_iter()))
    }

    pub fn shape(&self) -> ReturnShape {
        match self {
            Self::Table(_) | Self::Blank(_) => ReturnShape::FixedTable,
            Self::Sequence(_) => ReturnShape::LazySequence,
        }
    }
}

impl std::fmt::Debug for ProviderOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table(rows) => f.debug_tuple("Table").field(&rows.len()).finish(),
            Self::Blank(rows) => f.debug_tuple("Blank").field(rows).finish(),
            Self::Sequence(_) => f.write_str("Sequence(..)"),
        }
    }
}

/// Calls a data provider and hands back what it returned.
pub trait ProviderInvoker {
    fn invoke(&self, provider: &ProviderDescriptor) -> Result<ProviderOutput, InvocationError>;
}

impl<T: ProviderInvoker + ?Sized> ProviderInvoker for &T {
    fn invoke(&self, provider: &ProviderDescriptor) -> Result<ProviderOutput, InvocationError> {
        (**self).invoke(provider)
    }
}
