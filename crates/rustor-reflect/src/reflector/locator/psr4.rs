//! Composer PSR-4 autoload support

use super::directory::discover_files;
use super::SourceLocator;
use crate::declaration::Declaration;
use crate::error::ReflectionError;
use crate::extract::parse_source;
use crate::logging;
use crate::name::FullyQualifiedName;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Represents a parsed composer.json file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposerJson {
    #[serde(default)]
    pub autoload: AutoloadSection,

    #[serde(default, rename = "autoload-dev")]
    pub autoload_dev: AutoloadSection,
}

/// Autoload configuration section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutoloadSection {
    #[serde(default, rename = "psr-4")]
    pub psr4: HashMap<String, Psr4Paths>,
}

/// PSR-4 paths can be a single string or an array of strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Psr4Paths {
    Single(String),
    Multiple(Vec<String>),
}

impl Psr4Paths {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Psr4Paths::Single(s) => vec![s.clone()],
            Psr4Paths::Multiple(v) => v.clone(),
        }
    }
}

/// A resolved PSR-4 mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Psr4Mapping {
    /// Namespace prefix with a trailing separator, or empty for the fallback
    pub namespace_prefix: String,
    pub directories: Vec<PathBuf>,
}

impl Psr4Mapping {
    pub fn new(namespace_prefix: &str, directories: Vec<PathBuf>) -> Self {
        let trimmed = namespace_prefix.trim_matches('\\');
        let namespace_prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}\\", trimmed)
        };
        Self {
            namespace_prefix,
            directories,
        }
    }

    /// The part of `name` after this prefix, when the prefix applies
    fn relative_name<'n>(&self, name: &'n str) -> Option<&'n str> {
        let prefix_len = self.namespace_prefix.len();
        if name.len() <= prefix_len || !name.is_char_boundary(prefix_len) {
            return None;
        }
        let (head, rest) = name.split_at(prefix_len);
        head.eq_ignore_ascii_case(&self.namespace_prefix).then_some(rest)
    }
}

impl ComposerJson {
    pub fn load(path: &Path) -> Result<Self, ReflectionError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            ReflectionError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Nearest `composer.json` at or above `dir`
    pub fn find_in_directory(dir: &Path) -> Option<PathBuf> {
        let mut current = dir.to_path_buf();
        loop {
            let candidate = current.join("composer.json");
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    pub fn get_psr4_mappings(&self, base_dir: &Path, include_dev: bool) -> Vec<Psr4Mapping> {
        let mut sections = vec![&self.autoload];
        if include_dev {
            sections.push(&self.autoload_dev);
        }

        let mut mappings = Vec::new();
        for section in sections {
            for (namespace, paths) in &section.psr4 {
                let directories: Vec<PathBuf> = paths
                    .to_vec()
                    .into_iter()
                    .map(|p| base_dir.join(&p))
                    .collect();
                mappings.push(Psr4Mapping::new(namespace, directories));
            }
        }

        mappings
    }

    pub fn has_autoload(&self) -> bool {
        !self.autoload.psr4.is_empty()
    }
}

/// Locates a symbol by mapping its namespace to a file, the way composer's
/// autoloader would, and parsing only that file
#[derive(Debug, Clone)]
pub struct Psr4SourceLocator {
    mappings: Vec<Psr4Mapping>,
}

impl Psr4SourceLocator {
    /// Longer prefixes are tried first
    pub fn new(mut mappings: Vec<Psr4Mapping>) -> Self {
        mappings.sort_by(|a, b| {
            b.namespace_prefix
                .len()
                .cmp(&a.namespace_prefix.len())
                .then_with(|| a.namespace_prefix.cmp(&b.namespace_prefix))
        });
        Self { mappings }
    }

    /// Read the autoload map of a composer.json; paths are relative to its directory
    pub fn from_composer_file(path: &Path, include_dev: bool) -> Result<Self, ReflectionError> {
        logging::log(&format!("Reading composer autoload from {}", path.display()));
        let composer = ComposerJson::load(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::new(composer.get_psr4_mappings(base_dir, include_dev)))
    }

    pub fn mappings(&self) -> &[Psr4Mapping] {
        &self.mappings
    }

    /// Candidate files for `name`, in lookup order
    pub fn candidate_files(&self, name: &FullyQualifiedName) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        for mapping in &self.mappings {
            let Some(relative) = mapping.relative_name(name.as_str()) else {
                continue;
            };
            let relative_path = format!("{}.php", relative.replace('\\', "/"));
            for dir in &mapping.directories {
                candidates.push(dir.join(&relative_path));
            }
        }
        candidates
    }
}

impl SourceLocator for Psr4SourceLocator {
    fn name(&self) -> &str {
        "psr4"
    }

    fn locate(&self, name: &FullyQualifiedName) -> Result<Option<Declaration>, ReflectionError> {
        for file in self.candidate_files(name) {
            if !file.is_file() {
                continue;
            }
            let source = std::fs::read_to_string(&file)?;
            let found = parse_source(&source, Some(file.as_path()))?
                .into_iter()
                .find(|d| d.fully_qualified_name() == *name);
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    /// Symbols of every parseable file under the mapped directories
    fn symbols(&self) -> Result<Vec<FullyQualifiedName>, ReflectionError> {
        let roots: Vec<PathBuf> = self
            .mappings
            .iter()
            .flat_map(|m| m.directories.iter().cloned())
            .collect();

        let mut seen = HashSet::new();
        let mut symbols = Vec::new();
        for file in discover_files(&roots, &[]) {
            let Ok(source) = std::fs::read_to_string(&file) else {
                continue;
            };
            let Ok(declarations) = parse_source(&source, Some(file.as_path())) else {
                continue;
            };
            for declaration in declarations {
                let name = declaration.fully_qualified_name();
                if seen.insert(name.clone()) {
                    symbols.push(name);
                }
            }
        }
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_parse_composer_json() {
        let json = r#"{
            "autoload": { "psr-4": { "App\\": "src/", "Lib\\": ["lib/", "lib2/"] } },
            "autoload-dev": { "psr-4": { "Tests\\": "tests/" } }
        }"#;
        let composer: ComposerJson = serde_json::from_str(json).unwrap();
        assert!(composer.has_autoload());

        let mappings = composer.get_psr4_mappings(Path::new("/project"), false);
        assert_eq!(mappings.len(), 2);
        let lib = mappings.iter().find(|m| m.namespace_prefix == "Lib\\").unwrap();
        assert_eq!(
            lib.directories,
            vec![PathBuf::from("/project/lib/"), PathBuf::from("/project/lib2/")]
        );

        assert_eq!(composer.get_psr4_mappings(Path::new("/project"), true).len(), 3);
    }

    #[test]
    fn test_candidate_files_prefer_longest_prefix() {
        let locator = Psr4SourceLocator::new(vec![
            Psr4Mapping::new("App\\", vec![PathBuf::from("/src")]),
            Psr4Mapping::new("App\\Domain\\", vec![PathBuf::from("/domain")]),
            Psr4Mapping::new("", vec![PathBuf::from("/fallback")]),
        ]);

        let candidates = locator.candidate_files(&"App\\Domain\\Order".into());
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/domain/Order.php"),
                PathBuf::from("/src/Domain/Order.php"),
                PathBuf::from("/fallback/App/Domain/Order.php"),
            ]
        );
        assert_eq!(locator.candidate_files(&"App".into()), vec![PathBuf::from("/fallback/App.php")]);
    }

    #[test]
    fn test_locate_from_composer_file() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "composer.json",
            r#"{ "autoload": { "psr-4": { "App\\": "src/" } } }"#,
        );
        write(
            temp.path(),
            "src/Models/User.php",
            "<?php\nnamespace App\\Models;\n\nclass User extends Model {}\n",
        );
        write(temp.path(), "src/Models/Model.php", "<?php\nnamespace App\\Models;\n\nabstract class Model {}\n");

        let composer_path = ComposerJson::find_in_directory(&temp.path().join("src/Models")).unwrap();
        let locator = Psr4SourceLocator::from_composer_file(&composer_path, false).unwrap();

        let user = locator.locate(&"App\\Models\\User".into()).unwrap().unwrap();
        assert_eq!(user.location.start_line, 4);
        assert_eq!(user.parent.as_ref().unwrap().as_str(), "Model");
        assert!(locator.locate(&"App\\Models\\Missing".into()).unwrap().is_none());
        assert!(locator.locate(&"Other\\User".into()).unwrap().is_none());

        let mut names: Vec<_> = locator.symbols().unwrap().into_iter().map(|n| n.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["App\\Models\\Model", "App\\Models\\User"]);
    }

    #[test]
    fn test_invalid_composer_json() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "composer.json", "{ not json");
        let err = ComposerJson::load(&temp.path().join("composer.json")).unwrap_err();
        assert!(matches!(err, ReflectionError::Config(_)));
    }
}
