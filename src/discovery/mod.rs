//! Discovery of tests and data providers from Java sources.
//!
//! Source roots are walked once into a [`ClassIndex`]. A census is then fed
//! either by a package scan or by a suite document, both of which produce
//! a [`DescriptorSet`].

mod index;
mod package;
pub mod suite;
mod walk;

pub use index::ClassIndex;
pub use package::scan_package;
pub use suite::{load_suites, scan_suite, suite_descriptors, SuiteDocument};
pub use walk::{walk_source_files, DEFAULT_EXCLUDED_DIRS};

use serde::Serialize;

use crate::diagnostic::Diagnostic;
use crate::model::{ProviderDescriptor, TestDescriptor};

/// Tests to count, the providers visible to them, and anything that went
/// wrong while collecting either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DescriptorSet {
    pub tests: Vec<TestDescriptor>,
    pub providers: Vec<ProviderDescriptor>,
    pub diagnostics: Vec<Diagnostic>,
}
