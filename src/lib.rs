//! Case census
//!
//! Counts TestNG tests in Java sources, both as annotated methods and as
//! the concrete cases they expand to once each data provider is measured.
//! Sources are parsed with Tree-sitter; providers are evaluated statically
//! through a pluggable [`invoke::ProviderInvoker`].
pub mod census;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod discovery;
pub mod error;
pub mod invoke;
pub mod java;
pub mod logging;
pub mod model;
pub mod output;
pub mod utils;

pub use census::{count_annotated, count_expanded, take_census, Census};
pub use discovery::{ClassIndex, DescriptorSet};
pub use invoke::{ProviderInvoker, ProviderOutput, RegistryInvoker, SourceInvoker};
pub use model::{ClassRef, ProviderDescriptor, ReturnShape, TestDescriptor};
