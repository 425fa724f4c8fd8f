use anyhow::{Context as AnyhowContext, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::CensusConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "case-census")]
#[command(about = "Count TestNG tests and the cases their data providers expand to", long_about = None)]
pub struct Args {
    /// Root package to count (default: counttests)
    #[arg(value_name = "ROOT_PACKAGE")]
    pub root_package: Option<String>,

    /// Sub-package of the root whose tests are counted in the package scan
    #[arg(value_name = "SUB_PACKAGE")]
    pub sub_package: Option<String>,

    /// Directory holding Java test sources. Can be specified multiple times.
    #[arg(short = 's', long, value_name = "DIR")]
    pub source_root: Vec<PathBuf>,

    /// Suite document (YAML or JSON) for the suite run
    #[arg(long, value_name = "FILE")]
    pub suite: Option<PathBuf>,

    /// Config file (YAML or JSON); case-census.yaml is used if present
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Count disabled tests too
    #[arg(long)]
    pub all: bool,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text")]
    pub format: OutputFormat,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref config_path) = self.config {
            if !config_path.is_file() {
                anyhow::bail!("Config file does not exist: {}", config_path.display());
            }
        }
        for root in &self.source_root {
            validate_path(root)?;
        }
        Ok(())
    }

    /// Defaults, then the config file, then these flags.
    pub fn resolve_config(&self, cwd: &Path) -> Result<CensusConfig> {
        let config = match &self.config {
            Some(path) => CensusConfig::load(path)
                .with_context(|| format!("Cannot load config: {}", path.display()))?,
            None => CensusConfig::discover(cwd)
                .context("Cannot load case-census.yaml")?
                .unwrap_or_default(),
        };
        Ok(self.apply(config))
    }

    pub fn apply(&self, mut config: CensusConfig) -> CensusConfig {
        if let Some(root) = &self.root_package {
            config.root_package = root.clone();
        }
        if let Some(sub) = &self.sub_package {
            config.sub_package = sub.clone();
        }
        if !self.source_root.is_empty() {
            config.source_roots = self.source_root.clone();
        }
        if let Some(suite) = &self.suite {
            config.suite = suite.clone();
        }
        if self.all {
            config.only_enabled = false;
        }
        config
    }
}

pub fn validate_path(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("Path is not a directory: {}", path.display());
    }
    std::fs::read_dir(path)
        .with_context(|| format!("Cannot read directory: {}", path.display()))?;
    Ok(())
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args() -> Args {
        Args {
            root_package: None,
            sub_package: None,
            source_root: vec![],
            suite: None,
            config: None,
            all: false,
            format: OutputFormat::Text,
            verbose: 0,
            quiet: false,
        }
    }

    #[test]
    fn test_parse_positionals() {
        let args = Args::try_parse_from(["case-census", "com.shop", "checkout"]).unwrap();
        assert_eq!(args.root_package.as_deref(), Some("com.shop"));
        assert_eq!(args.sub_package.as_deref(), Some("checkout"));
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "case-census",
            "--source-root",
            "a",
            "-s",
            "b",
            "--all",
            "--format",
            "json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.source_root, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert!(args.all);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.verbose, 2);
        assert!(args.root_package.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let config = CensusConfig {
            root_package: "from.config".to_string(),
            sub_package: "sub".to_string(),
            ..CensusConfig::default()
        };
        let args = Args {
            root_package: Some("from.cli".to_string()),
            all: true,
            ..args()
        };

        let merged = args.apply(config);
        assert_eq!(merged.root_package, "from.cli");
        assert_eq!(merged.sub_package, "sub");
        assert!(!merged.only_enabled);
    }

    #[test]
    fn test_resolve_config_discovers_default_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("case-census.yaml"),
            "root_package: discovered\n",
        )
        .unwrap();

        let config = args().resolve_config(temp_dir.path()).unwrap();
        assert_eq!(config.root_package, "discovered");
    }

    #[test]
    fn test_resolve_config_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = args().resolve_config(temp_dir.path()).unwrap();
        assert_eq!(config, CensusConfig::default());
    }

    #[test]
    fn test_validate_missing_config() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/case-census.yaml")),
            ..args()
        };
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_source_roots() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("A.java");
        fs::write(&file_path, "class A {}").unwrap();

        let valid = Args {
            source_root: vec![temp_dir.path().to_path_buf()],
            ..args()
        };
        assert!(valid.validate().is_ok());

        let not_dir = Args {
            source_root: vec![file_path],
            ..args()
        };
        assert!(not_dir.validate().is_err());

        let missing = Args {
            source_root: vec![PathBuf::from("/nonexistent/path")],
            ..args()
        };
        assert!(missing.validate().is_err());
    }

    #[test]
    fn test_output_format_as_str() {
        assert_eq!(OutputFormat::Text.as_str(), "text");
        assert_eq!(OutputFormat::Json.as_str(), "json");
    }
}
