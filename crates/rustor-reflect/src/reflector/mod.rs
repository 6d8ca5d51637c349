//! Symbol lookup
//!
//! A [`Reflector`] turns a fully qualified name into the shared
//! [`SymbolReflection`] of its declaration. [`DefaultReflector`] asks an
//! ordered list of [`SourceLocator`]s and keeps one reflection per symbol.

pub mod locator;

pub use locator::{
    BuiltinSourceLocator, DeclarationLocator, DirectorySourceLocator, Psr4SourceLocator,
    SourceLocator, StringSourceLocator,
};

use crate::error::ReflectionError;
use crate::evaluate::{ConstantEvaluator, DefaultEvaluator};
use crate::logging;
use crate::name::FullyQualifiedName;
use crate::reflection::{ClassReflection, SymbolReflection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Default bound on inheritance and interface nesting
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Resolves names to reflections
///
/// Reflecting the same name twice yields reflections of the same
/// declaration. Whether the kind of the result fits the caller is not the
/// reflector's concern.
pub trait Reflector: Send + Sync {
    fn reflect(&self, name: &FullyQualifiedName) -> Result<Arc<SymbolReflection>, ReflectionError>;

    /// Evaluator for constant and property initializers
    fn evaluator(&self) -> &dyn ConstantEvaluator {
        &DefaultEvaluator
    }

    fn max_depth(&self) -> usize {
        DEFAULT_MAX_DEPTH
    }

    /// Reflect `name` and wrap it with hierarchy queries
    fn reflect_class(&self, name: &str) -> Result<ClassReflection<'_>, ReflectionError>
    where
        Self: Sized,
    {
        ClassReflection::for_name(name, self)
    }
}

/// Reflector backed by an ordered list of source locators
pub struct DefaultReflector {
    locators: Vec<Box<dyn SourceLocator>>,
    cache: Mutex<HashMap<FullyQualifiedName, Arc<SymbolReflection>>>,
    evaluator: Box<dyn ConstantEvaluator>,
    max_depth: usize,
}

impl Default for DefaultReflector {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultReflector {
    /// A reflector without locators; every lookup fails until one is added
    pub fn new() -> Self {
        Self {
            locators: Vec::new(),
            cache: Mutex::new(HashMap::new()),
            evaluator: Box::new(DefaultEvaluator),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Append a locator; earlier locators take precedence
    pub fn with_locator(mut self, locator: impl SourceLocator + 'static) -> Self {
        self.locators.push(Box::new(locator));
        self
    }

    pub fn with_boxed_locator(mut self, locator: Box<dyn SourceLocator>) -> Self {
        self.locators.push(locator);
        self
    }

    pub fn with_evaluator(mut self, evaluator: impl ConstantEvaluator + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn locator_names(&self) -> Vec<&str> {
        self.locators.iter().map(|l| l.name()).collect()
    }

    /// Every symbol the locators can enumerate, deduplicated, in locator order
    pub fn symbols(&self) -> Result<Vec<FullyQualifiedName>, ReflectionError> {
        let mut seen = std::collections::HashSet::new();
        let mut symbols = Vec::new();
        for locator in &self.locators {
            for name in locator.symbols()? {
                if seen.insert(name.clone()) {
                    symbols.push(name);
                }
            }
        }
        Ok(symbols)
    }

    /// Number of reflections built so far
    pub fn cached_count(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    fn cached(&self, name: &FullyQualifiedName) -> Option<Arc<SymbolReflection>> {
        self.cache.lock().ok()?.get(name).cloned()
    }
}

impl Reflector for DefaultReflector {
    fn reflect(&self, name: &FullyQualifiedName) -> Result<Arc<SymbolReflection>, ReflectionError> {
        if let Some(symbol) = self.cached(name) {
            logging::log_reflect(name.as_str(), true);
            return Ok(symbol);
        }

        // Locators may do I/O, so the cache is not held while they run. Two
        // threads may build the same symbol; the first insert wins.
        for locator in &self.locators {
            let Some(declaration) = locator.locate(name)? else {
                logging::log_locate(locator.name(), name.as_str(), false);
                continue;
            };
            logging::log_locate(locator.name(), name.as_str(), true);
            logging::log_reflect(name.as_str(), false);

            let symbol = Arc::new(SymbolReflection::new(declaration));
            return Ok(match self.cache.lock() {
                Ok(mut cache) => Arc::clone(cache.entry(name.clone()).or_insert(symbol)),
                Err(_) => symbol,
            });
        }

        Err(ReflectionError::ClassNotFound(name.to_string()))
    }

    fn evaluator(&self) -> &dyn ConstantEvaluator {
        self.evaluator.as_ref()
    }

    fn max_depth(&self) -> usize {
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::Declaration;

    #[test]
    fn test_first_locator_wins() {
        let reflector = DefaultReflector::new()
            .with_locator(DeclarationLocator::new(vec![
                Declaration::class("Foo").with_final(true)
            ]))
            .with_locator(DeclarationLocator::new(vec![
                Declaration::class("Foo"),
                Declaration::class("Bar"),
            ]));

        assert!(reflector.reflect(&"Foo".into()).unwrap().is_final());
        assert!(!reflector.reflect(&"Bar".into()).unwrap().is_final());
    }

    #[test]
    fn test_one_reflection_per_symbol() {
        let reflector =
            DefaultReflector::new().with_locator(DeclarationLocator::new(vec![Declaration::class("App\\Foo")]));
        let first = reflector.reflect(&"App\\Foo".into()).unwrap();
        let second = reflector.reflect(&"\\app\\FOO".into()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(reflector.cached_count(), 1);

        reflector.clear_cache();
        assert_eq!(reflector.cached_count(), 0);
    }

    #[test]
    fn test_not_found() {
        let reflector = DefaultReflector::new();
        let err = reflector.reflect(&"Missing".into()).unwrap_err();
        assert_eq!(err.to_string(), "Class \"Missing\" could not be found");
    }

    #[test]
    fn test_concurrent_reflect() {
        let reflector = Arc::new(
            DefaultReflector::new().with_locator(DeclarationLocator::new(vec![Declaration::class("Shared")])),
        );
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reflector = Arc::clone(&reflector);
                std::thread::spawn(move || reflector.reflect(&"Shared".into()).unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }

    #[test]
    fn test_reflect_class() {
        let reflector =
            DefaultReflector::new().with_locator(DeclarationLocator::new(vec![Declaration::class("Foo")]));
        let class = reflector.reflect_class("Foo").unwrap();
        assert_eq!(class.name().as_str(), "Foo");
        assert_eq!(reflector.locator_names(), vec!["declarations"]);
    }
}
