//! Source locators
//!
//! A locator knows where declarations come from: memory, a source string, a
//! directory tree, a composer autoload map or the builtin table.

mod builtin;
mod directory;
mod psr4;

pub use builtin::BuiltinSourceLocator;
pub use directory::DirectorySourceLocator;
pub use psr4::{ComposerJson, Psr4Mapping, Psr4SourceLocator};

use crate::declaration::Declaration;
use crate::error::ReflectionError;
use crate::extract::parse_source;
use crate::name::FullyQualifiedName;
use std::collections::HashMap;
use std::path::Path;

/// Finds the declaration of a symbol
pub trait SourceLocator: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// The declaration of `name`, or `None` when this locator does not know it
    fn locate(&self, name: &FullyQualifiedName) -> Result<Option<Declaration>, ReflectionError>;

    /// Symbols this locator can enumerate without further lookups
    fn symbols(&self) -> Result<Vec<FullyQualifiedName>, ReflectionError> {
        Ok(Vec::new())
    }
}

/// Declarations indexed by fully qualified name; a later duplicate replaces
/// an earlier one
#[derive(Debug, Default, Clone)]
pub(crate) struct DeclarationIndex {
    order: Vec<FullyQualifiedName>,
    declarations: HashMap<FullyQualifiedName, Declaration>,
}

impl DeclarationIndex {
    pub(crate) fn insert(&mut self, declaration: Declaration) {
        let name = declaration.fully_qualified_name();
        if self.declarations.insert(name.clone(), declaration).is_none() {
            self.order.push(name);
        }
    }

    pub(crate) fn get(&self, name: &FullyQualifiedName) -> Option<&Declaration> {
        self.declarations.get(name)
    }

    pub(crate) fn names(&self) -> Vec<FullyQualifiedName> {
        self.order.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }
}

impl FromIterator<Declaration> for DeclarationIndex {
    fn from_iter<I: IntoIterator<Item = Declaration>>(iter: I) -> Self {
        let mut index = Self::default();
        for declaration in iter {
            index.insert(declaration);
        }
        index
    }
}

/// Locator over declarations built in memory
#[derive(Debug, Default, Clone)]
pub struct DeclarationLocator {
    index: DeclarationIndex,
}

impl DeclarationLocator {
    pub fn new(declarations: impl IntoIterator<Item = Declaration>) -> Self {
        Self {
            index: declarations.into_iter().collect(),
        }
    }
}

impl SourceLocator for DeclarationLocator {
    fn name(&self) -> &str {
        "declarations"
    }

    fn locate(&self, name: &FullyQualifiedName) -> Result<Option<Declaration>, ReflectionError> {
        Ok(self.index.get(name).cloned())
    }

    fn symbols(&self) -> Result<Vec<FullyQualifiedName>, ReflectionError> {
        Ok(self.index.names())
    }
}

/// Locator over one PHP source string, parsed once up front
#[derive(Debug, Clone)]
pub struct StringSourceLocator {
    index: DeclarationIndex,
}

impl StringSourceLocator {
    pub fn new(source: &str) -> Result<Self, ReflectionError> {
        Ok(Self {
            index: parse_source(source, None)?.into_iter().collect(),
        })
    }

    /// Like [`StringSourceLocator::new`], recording `file` as the origin
    pub fn with_file(source: &str, file: &Path) -> Result<Self, ReflectionError> {
        Ok(Self {
            index: parse_source(source, Some(file))?.into_iter().collect(),
        })
    }
}

impl SourceLocator for StringSourceLocator {
    fn name(&self) -> &str {
        "string"
    }

    fn locate(&self, name: &FullyQualifiedName) -> Result<Option<Declaration>, ReflectionError> {
        Ok(self.index.get(name).cloned())
    }

    fn symbols(&self) -> Result<Vec<FullyQualifiedName>, ReflectionError> {
        Ok(self.index.names())
    }
}
