use crate::baseline::DEFAULT_BASELINE_FILE;
use crate::error::{FixityError, Result};
use crate::index::hasher::HashAlgorithm;
use crate::report::DEFAULT_AUDIT_LOG;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use xdg::BaseDirectories;

/// Keys accepted in `fixity.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub baseline: Option<PathBuf>,
    pub audit_log: Option<PathBuf>,
    pub algorithm: Option<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub follow_symlinks: Option<bool>,
    pub max_depth: Option<usize>,
    pub include_hidden: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FixityError::io(path, e))?;
        toml::from_str(&content)
            .map_err(|e| FixityError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }
}

/// Settings given on the command line; `None` defers to env / file / default.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub baseline: Option<PathBuf>,
    pub audit_log: Option<PathBuf>,
    pub algorithm: Option<String>,
    pub exclude: Vec<String>,
    pub follow_symlinks: bool,
    pub max_depth: Option<usize>,
    pub skip_hidden: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub baseline_path: PathBuf,
    pub audit_log_path: PathBuf,
    pub algorithm: HashAlgorithm,
    pub exclude: Vec<String>,
    pub follow_symlinks: bool,
    pub max_depth: Option<usize>,
    pub include_hidden: bool,
    pub config_path: Option<PathBuf>,
}

impl Config {
    /// Resolves settings: command line, then `FIXITY_BASELINE` /
    /// `FIXITY_AUDIT_LOG`, then the config file, then defaults.
    pub fn new(config_override: Option<PathBuf>, overrides: Overrides) -> Result<Self> {
        let config_path = match config_override {
            Some(path) => Some(path),
            None => BaseDirectories::with_prefix("fixity")
                .ok()
                .and_then(|xdg| xdg.find_config_file("fixity.toml")),
        };

        let file = match &config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        Self::resolve(
            file,
            overrides,
            std::env::var_os("FIXITY_BASELINE").map(PathBuf::from),
            std::env::var_os("FIXITY_AUDIT_LOG").map(PathBuf::from),
            config_path,
        )
    }

    fn resolve(
        file: FileConfig,
        overrides: Overrides,
        env_baseline: Option<PathBuf>,
        env_audit_log: Option<PathBuf>,
        config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let baseline_path = overrides
            .baseline
            .or(env_baseline)
            .or(file.baseline)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BASELINE_FILE));

        let audit_log_path = overrides
            .audit_log
            .or(env_audit_log)
            .or(file.audit_log)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_AUDIT_LOG));

        let algorithm = match overrides.algorithm.or(file.algorithm) {
            Some(name) => name.parse()?,
            None => HashAlgorithm::default(),
        };

        let mut exclude = file.exclude;
        exclude.extend(overrides.exclude);

        Ok(Self {
            baseline_path,
            audit_log_path,
            algorithm,
            exclude,
            follow_symlinks: overrides.follow_symlinks || file.follow_symlinks.unwrap_or(false),
            max_depth: overrides.max_depth.or(file.max_depth),
            include_hidden: !overrides.skip_hidden && file.include_hidden.unwrap_or(true),
            config_path,
        })
    }
}
