//! Configuration file support for rustor-reflect
//!
//! Loads `.rustor-reflect.toml` from the current directory or parent
//! directories and turns it into a [`DefaultReflector`].

use crate::error::ReflectionError;
use crate::logging;
use crate::reflector::{
    BuiltinSourceLocator, DefaultReflector, DirectorySourceLocator, Psr4SourceLocator,
    DEFAULT_MAX_DEPTH,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".rustor-reflect.toml";

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReflectorConfig {
    pub locator: LocatorConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,

    /// Directory relative paths are resolved against; the config file's
    /// directory when loaded from disk
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Consult the internal PHP classes first
    pub builtins: bool,
    /// Directories (or files) scanned for declarations
    pub paths: Vec<PathBuf>,
    /// Glob patterns to exclude from scanning
    pub exclude: Vec<String>,
    /// composer.json whose PSR-4 map is used for lookups
    pub composer: Option<PathBuf>,
    /// Also use the `autoload-dev` map
    pub include_dev: bool,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            builtins: true,
            paths: Vec::new(),
            exclude: Vec::new(),
            composer: None,
            include_dev: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Bound on inheritance and interface nesting
    pub max_depth: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file; logging stays off when unset
    pub file: Option<PathBuf>,
}

impl ReflectorConfig {
    /// Load config searching from the current directory upward
    pub fn load() -> Result<Option<(ReflectorConfig, PathBuf)>, ReflectionError> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(ReflectorConfig, PathBuf)>, ReflectionError> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<ReflectorConfig, ReflectionError> {
        logging::log_config_load(path);
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ReflectionError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::parse(&contents)
            .map_err(|e| ReflectionError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parse config text; relative paths stay relative to the working directory
    pub fn parse(contents: &str) -> Result<ReflectorConfig, toml::de::Error> {
        toml::from_str(contents)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Scan roots with relative entries resolved
    pub fn scan_paths(&self) -> Vec<PathBuf> {
        self.locator.paths.iter().map(|p| self.resolve(p)).collect()
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging.file.as_deref().map(|p| self.resolve(p))
    }

    /// Assemble the locator chain: builtins, then composer, then directories
    pub fn build(&self) -> Result<DefaultReflector, ReflectionError> {
        if self.limits.max_depth == 0 {
            return Err(ReflectionError::Config(
                "limits.max_depth must be greater than zero".to_string(),
            ));
        }

        let mut reflector = DefaultReflector::new().with_max_depth(self.limits.max_depth);

        if self.locator.builtins {
            reflector = reflector.with_locator(BuiltinSourceLocator::new());
        }

        if let Some(composer) = &self.locator.composer {
            let composer = self.resolve(composer);
            let locator = Psr4SourceLocator::from_composer_file(&composer, self.locator.include_dev)
                .map_err(|e| match e {
                    ReflectionError::Io(io) => ReflectionError::Config(format!(
                        "Failed to read {}: {}",
                        composer.display(),
                        io
                    )),
                    other => other,
                })?;
            reflector = reflector.with_locator(locator);
        }

        let paths = self.scan_paths();
        if !paths.is_empty() {
            let locator = DirectorySourceLocator::with_excludes(&paths, &self.locator.exclude);
            for failure in locator.failures() {
                logging::log(&format!("Skipped: {}", failure));
            }
            reflector = reflector.with_locator(locator);
        }

        logging::log(&format!("Locators: {}", reflector.locator_names().join(", ")));
        Ok(reflector)
    }
}
