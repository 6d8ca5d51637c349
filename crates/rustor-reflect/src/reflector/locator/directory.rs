//! Locator over PHP files found under directory trees

use super::{DeclarationIndex, SourceLocator};
use crate::declaration::Declaration;
use crate::error::ReflectionError;
use crate::extract::parse_source;
use crate::logging;
use crate::name::FullyQualifiedName;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Scans directories for `*.php` files once and indexes every declaration
#[derive(Debug)]
pub struct DirectorySourceLocator {
    roots: Vec<PathBuf>,
    index: DeclarationIndex,
    files: usize,
    failures: Vec<ReflectionError>,
}

impl DirectorySourceLocator {
    pub fn new(roots: &[PathBuf]) -> Self {
        Self::with_excludes(roots, &[])
    }

    /// Scan `roots`, skipping paths matching any of the glob `exclude` patterns.
    /// Files that fail to parse are skipped and reported by [`Self::failures`].
    pub fn with_excludes(roots: &[PathBuf], exclude: &[String]) -> Self {
        let files = discover_files(roots, exclude);

        let results: Vec<Result<Vec<Declaration>, ReflectionError>> = files
            .par_iter()
            .map(|file| {
                let source = fs::read_to_string(file)?;
                parse_source(&source, Some(file.as_path()))
            })
            .collect();

        let mut index = DeclarationIndex::default();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(declarations) => declarations.into_iter().for_each(|d| index.insert(d)),
                Err(e) => failures.push(e),
            }
        }

        logging::log_scan_summary(roots, files.len(), index.len(), failures.len());

        Self {
            roots: roots.to_vec(),
            index,
            files: files.len(),
            failures,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn file_count(&self) -> usize {
        self.files
    }

    pub fn symbol_count(&self) -> usize {
        self.index.len()
    }

    /// Files that could not be read or parsed
    pub fn failures(&self) -> &[ReflectionError] {
        &self.failures
    }
}

impl SourceLocator for DirectorySourceLocator {
    fn name(&self) -> &str {
        "directory"
    }

    fn locate(&self, name: &FullyQualifiedName) -> Result<Option<Declaration>, ReflectionError> {
        Ok(self.index.get(name).cloned())
    }

    fn symbols(&self) -> Result<Vec<FullyQualifiedName>, ReflectionError> {
        Ok(self.index.names())
    }
}

/// PHP files under `roots` (files are taken as is), sorted for a stable
/// duplicate policy
pub(super) fn discover_files(roots: &[PathBuf], exclude: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for root in roots {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.is_dir() {
            continue;
        }
        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file()
                && path.extension().map(|e| e == "php").unwrap_or(false)
                && !is_excluded(path, exclude)
            {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

/// Check a path against glob patterns; `dir/` patterns match any path segment
pub fn is_excluded(path: &Path, patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();

    for pattern in patterns {
        if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
            if glob_pattern.matches(&path_str) {
                return true;
            }
            if let Some(file_name) = path.file_name() {
                if glob_pattern.matches(&file_name.to_string_lossy()) {
                    return true;
                }
            }
        }

        if pattern.ends_with('/') {
            let dir_pattern = pattern.trim_end_matches('/');
            if path_str.contains(&format!("/{}/", dir_pattern))
                || path_str.starts_with(&format!("{}/", dir_pattern))
            {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scans_nested_directories() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/Models/User.php", "<?php namespace App\\Models; class User {}");
        write(temp.path(), "src/Contracts/HasName.php", "<?php namespace App\\Contracts; interface HasName {}");
        write(temp.path(), "src/readme.txt", "class NotPhp {}");

        let locator = DirectorySourceLocator::new(&[temp.path().join("src")]);
        assert_eq!(locator.file_count(), 2);
        assert_eq!(locator.symbol_count(), 2);

        let user = locator.locate(&"App\\Models\\User".into()).unwrap().unwrap();
        assert!(user.location.file.as_ref().unwrap().ends_with("User.php"));
        assert_eq!(user.location.start_line, 1);
    }

    #[test]
    fn test_excludes_and_parse_failures() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/A.php", "<?php class A {}");
        write(temp.path(), "src/vendor/B.php", "<?php class B {}");
        write(temp.path(), "src/C.generated.php", "<?php class C {}");
        write(temp.path(), "src/Broken.php", "<?php class {");

        let locator = DirectorySourceLocator::with_excludes(
            &[temp.path().join("src")],
            &["vendor/".to_string(), "*.generated.php".to_string()],
        );
        let names: Vec<_> = locator.symbols().unwrap().into_iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["A"]);
        assert_eq!(locator.failures().len(), 1);
    }

    #[test]
    fn test_is_excluded() {
        let patterns = vec!["tests/".to_string(), "*Stub.php".to_string()];
        assert!(is_excluded(Path::new("/app/tests/FooTest.php"), &patterns));
        assert!(is_excluded(Path::new("/app/src/UserStub.php"), &patterns));
        assert!(!is_excluded(Path::new("/app/src/User.php"), &patterns));
    }
}
