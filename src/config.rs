use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::utils::DocumentFormat;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "case-census.yaml";

pub const DEFAULT_ROOT_PACKAGE: &str = "counttests";
pub const DEFAULT_SOURCE_ROOT: &str = "src/test/java";
pub const DEFAULT_SUITE: &str = "testng.xml";

/// Settings for one census run. Every field is optional in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CensusConfig {
    pub source_roots: Vec<PathBuf>,
    pub root_package: String,
    pub sub_package: String,
    pub suite: PathBuf,
    pub only_enabled: bool,
    pub excluded_dirs: Vec<String>,
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            source_roots: vec![PathBuf::from(DEFAULT_SOURCE_ROOT)],
            root_package: DEFAULT_ROOT_PACKAGE.to_string(),
            sub_package: String::new(),
            suite: PathBuf::from(DEFAULT_SUITE),
            only_enabled: true,
            excluded_dirs: Vec::new(),
        }
    }
}

impl CensusConfig {
    /// Reads a YAML or JSON config file. Relative paths inside it are taken
    /// relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = DocumentFormat::from_path(path).map_err(ConfigError::unsupported_format)?;
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e.to_string()))?;
        let config = Self::parse(&content, format, path)?;

        let base = path.parent().unwrap_or(Path::new(""));
        debug!(path = %path.display(), "loaded census config");
        Ok(config.relative_to(base))
    }

    pub fn parse(content: &str, format: DocumentFormat, path: &Path) -> Result<Self, ConfigError> {
        match format {
            DocumentFormat::Yaml if content.trim().is_empty() => Ok(Self::default()),
            DocumentFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| ConfigError::parse_error(path, e.to_string())),
            DocumentFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::parse_error(path, e.to_string())),
            DocumentFormat::Xml => Err(ConfigError::unsupported_format("xml")),
        }
    }

    /// Loads `case-census.yaml` from `dir` if there is one.
    pub fn discover(dir: &Path) -> Result<Option<Self>, ConfigError> {
        let path = dir.join(DEFAULT_CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    fn relative_to(mut self, base: &Path) -> Self {
        let rebase = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };
        self.source_roots = self.source_roots.iter().map(|p| rebase(p)).collect();
        self.suite = rebase(&self.suite);
        self
    }

    /// Package whose tests are counted: `root.sub`, or `root` alone.
    pub fn test_package(&self) -> String {
        crate::utils::join_package(&self.root_package, &self.sub_package)
    }
}
