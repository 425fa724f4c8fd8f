//! Test-case census.
//!
//! Two numbers come out of a census: how many methods are tagged as tests,
//! and how many concrete cases those tests expand to once every data
//! provider has been resolved and measured.

mod aggregator;
mod counter;
mod evaluator;
mod resolver;

pub use aggregator::{count_expanded, expand, Contribution, ContributionSource, ExpansionReport};
pub use counter::{count_annotated, is_counted};
pub use evaluator::evaluate;
pub use resolver::{resolve, search_class};

use serde::Serialize;

use crate::diagnostic::Diagnostic;
use crate::discovery::DescriptorSet;
use crate::invoke::ProviderInvoker;

/// Both counts for one set of tests, with everything that reduced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Census {
    pub annotated: usize,
    pub expanded: usize,
    pub contributions: Vec<Contribution>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn take_census(
    set: &DescriptorSet,
    only_enabled: bool,
    invoker: &dyn ProviderInvoker,
) -> Census {
    let annotated = count_annotated(&set.tests, only_enabled);
    let report = expand(&set.tests, &set.providers, only_enabled, invoker);

    let mut diagnostics = set.diagnostics.clone();
    diagnostics.extend(report.diagnostics);
    Census {
        annotated,
        expanded: report.total,
        contributions: report.contributions,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::RegistryInvoker;
    use crate::model::{ProviderDescriptor, ReturnShape, TestDescriptor};

    #[test]
    fn test_census_carries_discovery_and_expansion_diagnostics() {
        let set = DescriptorSet {
            tests: vec![
                TestDescriptor::new("a.B", "plain"),
                TestDescriptor::new("a.B", "driven").with_provider("rows"),
                TestDescriptor::new("a.B", "orphan").with_provider("missing"),
            ],
            providers: vec![ProviderDescriptor::new("rows", "a.B", ReturnShape::FixedTable)],
            diagnostics: vec![Diagnostic::discovery(None, "unreadable file")],
        };
        let mut invoker = RegistryInvoker::new();
        invoker.register_table("a.B", "rows", vec![vec!["1".to_string()]; 3]);

        let census = take_census(&set, true, &invoker);
        assert_eq!(census.annotated, 3);
        assert_eq!(census.expanded, 4);
        assert_eq!(census.contributions.len(), 3);
        assert_eq!(census.diagnostics.len(), 2);
        assert!(census.diagnostics[0].is_discovery());
    }

    #[test]
    fn test_provider_free_census_counts_agree() {
        let set = DescriptorSet {
            tests: vec![
                TestDescriptor::new("a.B", "one"),
                TestDescriptor::new("a.B", "two").with_enabled(false),
            ],
            ..DescriptorSet::default()
        };
        let invoker = RegistryInvoker::new();
        for only_enabled in [true, false] {
            let census = take_census(&set, only_enabled, &invoker);
            assert_eq!(census.annotated, census.expanded);
        }
    }
}
