use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use tracing::{info, warn};

use case_census::census::{take_census, Census};
use case_census::cli::{self, OutputFormat};
use case_census::config::CensusConfig;
use case_census::discovery::{scan_package, scan_suite, ClassIndex};
use case_census::invoke::SourceInvoker;
use case_census::logging::{self, Verbosity};
use case_census::output::OutputFormatter;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    logging::init(Verbosity::from_flags(args.verbose, args.quiet));
    args.validate().context("Invalid arguments")?;

    let cwd = std::env::current_dir().context("Cannot determine working directory")?;
    let config = args.resolve_config(&cwd)?;
    info!(
        package = %config.test_package(),
        roots = config.source_roots.len(),
        suite = %config.suite.display(),
        "starting census"
    );

    let (suite, package) = run(&config)?;
    if args.format == OutputFormat::Text {
        // Index problems appear in both runs; report them once.
        let mut reported = Vec::new();
        for diagnostic in suite.diagnostics.iter().chain(&package.diagnostics) {
            if diagnostic.is_discovery() && !reported.contains(&diagnostic) {
                warn!("{diagnostic}");
                reported.push(diagnostic);
            }
        }
    }

    let output = OutputFormatter::format(&config, &suite, &package, args.format)?;
    print!("{output}");
    Ok(())
}

fn run(config: &CensusConfig) -> Result<(Census, Census)> {
    let index = ClassIndex::build(&config.source_roots, &config.excluded_dirs);
    info!(classes = index.len(), "indexed test sources");

    let invoker = SourceInvoker::new().context("Cannot initialise the Java parser")?;

    let suite_set = scan_suite(&config.suite, &index, &config.root_package);
    let suite = take_census(&suite_set, config.only_enabled, &invoker);

    let package_set = scan_package(&index, &config.root_package, &config.sub_package);
    let package = take_census(&package_set, config.only_enabled, &invoker);

    Ok((suite, package))
}
