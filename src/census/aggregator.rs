use serde::Serialize;
use tracing::{debug, warn};

use super::counter::is_counted;
use super::evaluator::evaluate;
use super::resolver::{resolve, search_class};
use crate::diagnostic::Diagnostic;
use crate::invoke::ProviderInvoker;
use crate::model::{ProviderDescriptor, TestDescriptor};

/// How a test arrived at its case count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContributionSource {
    /// No data provider: one case.
    Single,
    /// Cases counted from a resolved provider.
    Provider { provider: String },
    /// The named provider was not found. Contributes nothing.
    ProviderNotFound { provider: String },
    /// The provider was found but could not be invoked. Contributes nothing.
    InvocationFailed { provider: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contribution {
    pub test: String,
    pub cases: usize,
    pub source: ContributionSource,
}

/// Outcome of expanding every counted test into its cases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpansionReport {
    pub total: usize,
    pub contributions: Vec<Contribution>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ExpansionReport {
    fn push(&mut self, contribution: Contribution) {
        self.total += contribution.cases;
        self.contributions.push(contribution);
    }

    pub fn unresolved_count(&self) -> usize {
        self.contributions
            .iter()
            .filter(|c| matches!(c.source, ContributionSource::ProviderNotFound { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.contributions
            .iter()
            .filter(|c| matches!(c.source, ContributionSource::InvocationFailed { .. }))
            .count()
    }
}

/// Expands each counted test into its concrete cases.
///
/// A test without a provider is one case. A test with a provider contributes
/// whatever the provider yields, or nothing when the provider cannot be
/// found or invoked. Failures never stop the remaining tests from being
/// counted; they are recorded as diagnostics instead.
pub fn expand(
    tests: &[TestDescriptor],
    providers: &[ProviderDescriptor],
    only_enabled: bool,
    invoker: &dyn ProviderInvoker,
) -> ExpansionReport {
    let mut report = ExpansionReport::default();

    for test in tests {
        if !is_counted(test, only_enabled) {
            debug!(test = %test.qualified_name(), "skipping disabled test");
            continue;
        }

        if !test.has_provider() {
            report.push(Contribution {
                test: test.qualified_name(),
                cases: 1,
                source: ContributionSource::Single,
            });
            continue;
        }

        let class = search_class(test);
        let Some(provider) = resolve(&test.provider_name, class, providers) else {
            warn!(
                test = %test.qualified_name(),
                provider = %test.provider_name,
                class = %class,
                "data provider not found"
            );
            report.diagnostics.push(Diagnostic::ProviderNotFound {
                test: test.qualified_name(),
                provider: test.provider_name.clone(),
                search_class: class.clone(),
            });
            report.push(Contribution {
                test: test.qualified_name(),
                cases: 0,
                source: ContributionSource::ProviderNotFound {
                    provider: test.provider_name.clone(),
                },
            });
            continue;
        };

        match evaluate(provider, invoker) {
            Ok(cases) => report.push(Contribution {
                test: test.qualified_name(),
                cases,
                source: ContributionSource::Provider {
                    provider: provider.qualified_name(),
                },
            }),
            Err(e) => {
                warn!(
                    test = %test.qualified_name(),
                    provider = %provider.qualified_name(),
                    error = %e,
                    "data provider invocation failed"
                );
                report.diagnostics.push(Diagnostic::InvocationFailed {
                    test: test.qualified_name(),
                    provider: provider.qualified_name(),
                    reason: e.kind().to_string(),
                    message: e.to_string(),
                });
                report.push(Contribution {
                    test: test.qualified_name(),
                    cases: 0,
                    source: ContributionSource::InvocationFailed {
                        provider: provider.qualified_name(),
                    },
                });
            }
        }
    }

    debug!(
        total = report.total,
        tests = report.contributions.len(),
        "expanded test cases"
    );
    report
}

/// Number of concrete test cases after data-provider expansion.
pub fn count_expanded(
    tests: &[TestDescriptor],
    providers: &[ProviderDescriptor],
    only_enabled: bool,
    invoker: &dyn ProviderInvoker,
) -> usize {
    expand(tests, providers, only_enabled, invoker).total
}
