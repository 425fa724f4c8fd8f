use anyhow::Result;
use serde::Serialize;

use crate::census::{Census, Contribution};
use crate::cli::OutputFormat;
use crate::config::CensusConfig;
use crate::diagnostic::Diagnostic;

fn is_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}

/// Counts of a single run, suite-driven or package-driven.
#[derive(Debug, Serialize)]
pub struct RunOutput<'a> {
    pub annotated: usize,
    pub expanded: usize,
    #[serde(skip_serializing_if = "is_empty")]
    pub contributions: &'a [Contribution],
    #[serde(skip_serializing_if = "is_empty")]
    pub diagnostics: &'a [Diagnostic],
}

impl<'a> RunOutput<'a> {
    pub fn from_census(census: &'a Census) -> Self {
        Self {
            annotated: census.annotated,
            expanded: census.expanded,
            contributions: &census.contributions,
            diagnostics: &census.diagnostics,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CensusOutput<'a> {
    pub root_package: &'a str,
    pub sub_package: &'a str,
    pub only_enabled: bool,
    pub suite: RunOutput<'a>,
    pub package: RunOutput<'a>,
}

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn format(
        config: &CensusConfig,
        suite: &Census,
        package: &Census,
        format: OutputFormat,
    ) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(Self::text(config, suite, package)),
            OutputFormat::Json => {
                let output = Self::build_output(config, suite, package);
                Ok(serde_json::to_string_pretty(&output)?)
            }
        }
    }

    /// Four `label = count` lines: suite annotated, suite expanded, package
    /// annotated, package expanded.
    pub fn text(config: &CensusConfig, suite: &Census, package: &Census) -> String {
        let suite_file = config.suite.display();
        let test_package = config.test_package();
        format!(
            "Test cases annotated by @Test in suite {suite_file} = {}\n\
             Amount of tests in suite {suite_file} = {}\n\
             Test cases annotated by @Test in package {test_package} = {}\n\
             Amount of tests in package {test_package} = {}\n",
            suite.annotated, suite.expanded, package.annotated, package.expanded
        )
    }

    pub fn build_output<'a>(
        config: &'a CensusConfig,
        suite: &'a Census,
        package: &'a Census,
    ) -> CensusOutput<'a> {
        CensusOutput {
            root_package: &config.root_package,
            sub_package: &config.sub_package,
            only_enabled: config.only_enabled,
            suite: RunOutput::from_census(suite),
            package: RunOutput::from_census(package),
        }
    }
}
