//! The public reflection surface
//!
//! [`ClassReflection`] pairs a shared [`SymbolReflection`] with the reflector
//! used to reach related symbols. The reflector is borrowed, never owned, so
//! reflections stay free of reference cycles.

use super::hierarchy::HierarchyResolver;
use super::members::{ConstantReflection, MethodReflection, PropertyReflection};
use super::symbol::SymbolReflection;
use crate::declaration::SymbolKind;
use crate::error::ReflectionError;
use crate::evaluate::{EvaluationError, Value};
use crate::name::FullyQualifiedName;
use crate::reflector::Reflector;
use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Reflection over a class, interface or trait, with hierarchy queries
#[derive(Clone)]
pub struct ClassReflection<'r> {
    symbol: Arc<SymbolReflection>,
    reflector: &'r dyn Reflector,
}

impl fmt::Debug for ClassReflection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassReflection")
            .field("name", self.symbol.name())
            .field("kind", &self.symbol.kind())
            .finish()
    }
}

impl<'r> ClassReflection<'r> {
    pub fn new(symbol: Arc<SymbolReflection>, reflector: &'r dyn Reflector) -> Self {
        Self { symbol, reflector }
    }

    /// Reflect `name` through `reflector`
    pub fn for_name(name: &str, reflector: &'r dyn Reflector) -> Result<Self, ReflectionError> {
        let fqn = FullyQualifiedName::new(name);
        if fqn.is_empty() {
            return Err(ReflectionError::InvalidArgument(
                "class name must not be empty".to_string(),
            ));
        }
        let symbol = reflector.reflect(&fqn)?;
        Ok(Self::new(symbol, reflector))
    }

    fn hierarchy(&self) -> HierarchyResolver<'r> {
        HierarchyResolver::new(self.reflector)
    }

    fn wrap(&self, symbol: Arc<SymbolReflection>) -> ClassReflection<'r> {
        ClassReflection::new(symbol, self.reflector)
    }

    pub fn symbol(&self) -> &Arc<SymbolReflection> {
        &self.symbol
    }

    pub fn name(&self) -> &FullyQualifiedName {
        self.symbol.name()
    }

    pub fn short_name(&self) -> &str {
        self.symbol.short_name()
    }

    pub fn namespace_name(&self) -> String {
        self.symbol.namespace_name()
    }

    pub fn in_namespace(&self) -> bool {
        self.symbol.in_namespace()
    }

    pub fn kind(&self) -> SymbolKind {
        self.symbol.kind()
    }

    pub fn is_interface(&self) -> bool {
        self.symbol.is_interface()
    }

    pub fn is_trait(&self) -> bool {
        self.symbol.is_trait()
    }

    pub fn is_abstract(&self) -> bool {
        self.symbol.is_abstract()
    }

    pub fn is_final(&self) -> bool {
        self.symbol.is_final()
    }

    pub fn is_instantiable(&self) -> bool {
        self.symbol.is_instantiable()
    }

    pub fn is_internal(&self) -> bool {
        self.symbol.is_internal()
    }

    pub fn is_user_defined(&self) -> bool {
        self.symbol.is_user_defined()
    }

    pub fn is_cloneable(&self) -> Result<bool, ReflectionError> {
        self.hierarchy().is_cloneable(&self.symbol)
    }

    pub fn is_iterateable(&self) -> Result<bool, ReflectionError> {
        self.hierarchy().is_iterateable(&self.symbol)
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.symbol.file_name()
    }

    pub fn start_line(&self) -> usize {
        self.symbol.start_line()
    }

    pub fn end_line(&self) -> usize {
        self.symbol.end_line()
    }

    pub fn doc_comment(&self) -> Option<&str> {
        self.symbol.doc_comment()
    }

    pub fn parent_class(&self) -> Result<Option<ClassReflection<'r>>, ReflectionError> {
        Ok(self.hierarchy().parent(&self.symbol)?.map(|p| self.wrap(p)))
    }

    /// Root to self
    pub fn inheritance_chain(&self) -> Result<Vec<ClassReflection<'r>>, ReflectionError> {
        Ok(self
            .hierarchy()
            .inheritance_chain(&self.symbol)?
            .into_iter()
            .map(|s| self.wrap(s))
            .collect())
    }

    pub fn is_subclass_of(&self, name: &str) -> Result<bool, ReflectionError> {
        self.hierarchy().is_subclass_of(&self.symbol, name)
    }

    pub fn is_instance(&self, value: &Value) -> Result<bool, ReflectionError> {
        self.hierarchy().is_instance(&self.symbol, value)
    }

    pub fn interfaces(&self) -> Result<IndexMap<FullyQualifiedName, ClassReflection<'r>>, ReflectionError> {
        Ok(self
            .hierarchy()
            .interfaces(&self.symbol)?
            .into_iter()
            .map(|(name, s)| (name, self.wrap(s)))
            .collect())
    }

    pub fn interface_names(&self) -> Result<Vec<FullyQualifiedName>, ReflectionError> {
        self.hierarchy().interface_names(&self.symbol)
    }

    pub fn implements_interface(&self, name: &str) -> Result<bool, ReflectionError> {
        self.hierarchy().implements_interface(&self.symbol, name)
    }

    /// Only valid on interfaces: the interface and everything it extends
    pub fn interface_hierarchy(
        &self,
    ) -> Result<IndexMap<FullyQualifiedName, ClassReflection<'r>>, ReflectionError> {
        Ok(self
            .hierarchy()
            .interface_hierarchy(&self.symbol)?
            .into_iter()
            .map(|(name, s)| (name, self.wrap(s)))
            .collect())
    }

    pub fn traits(&self) -> Result<Vec<ClassReflection<'r>>, ReflectionError> {
        Ok(self
            .hierarchy()
            .traits(&self.symbol)?
            .into_iter()
            .map(|s| self.wrap(s))
            .collect())
    }

    pub fn trait_names(&self) -> Result<Vec<FullyQualifiedName>, ReflectionError> {
        self.hierarchy().trait_names(&self.symbol)
    }

    pub fn trait_aliases(&self) -> Result<IndexMap<String, String>, ReflectionError> {
        self.hierarchy().trait_aliases(&self.symbol)
    }

    /// Methods declared directly on this symbol
    pub fn declared_methods(&self) -> Vec<&MethodReflection> {
        self.symbol.methods().collect()
    }

    /// Own, trait and inherited methods
    pub fn methods(&self) -> Result<Vec<MethodReflection>, ReflectionError> {
        Ok(self.hierarchy().all_methods(&self.symbol)?.into_values().collect())
    }

    pub fn method(&self, name: &str) -> Result<MethodReflection, ReflectionError> {
        if let Ok(method) = self.symbol.method(name) {
            return Ok(method.clone());
        }
        self.hierarchy()
            .all_methods(&self.symbol)?
            .shift_remove(&name.to_lowercase())
            .ok_or_else(|| ReflectionError::MethodNotFound {
                class: self.name().to_string(),
                method: name.to_string(),
            })
    }

    /// Existence check; lookup failures count as absent
    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_ok()
    }

    pub fn properties(&self) -> Result<Vec<PropertyReflection>, ReflectionError> {
        Ok(self
            .hierarchy()
            .all_properties(&self.symbol)?
            .into_values()
            .collect())
    }

    pub fn property(&self, name: &str) -> Result<PropertyReflection, ReflectionError> {
        let name = name.trim_start_matches('$');
        if let Ok(property) = self.symbol.property(name) {
            return Ok(property.clone());
        }
        self.hierarchy()
            .all_properties(&self.symbol)?
            .shift_remove(name)
            .ok_or_else(|| ReflectionError::PropertyNotFound {
                class: self.name().to_string(),
                property: name.to_string(),
            })
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_ok()
    }

    pub fn default_properties(&self) -> Result<IndexMap<String, Value>, ReflectionError> {
        self.hierarchy().default_properties(&self.symbol)
    }

    /// Own and inherited constants, unevaluated
    pub fn constant_reflections(&self) -> Result<Vec<ConstantReflection>, ReflectionError> {
        self.hierarchy()
            .all_constants(&self.symbol)?
            .into_iter()
            .map(|(name, owner)| owner.constant(&name).cloned())
            .collect()
    }

    /// Every visible constant, evaluated; failures are kept per entry
    pub fn constants(&self) -> Result<IndexMap<String, Result<Value, EvaluationError>>, ReflectionError> {
        self.hierarchy().constant_values(&self.symbol)
    }

    pub fn constant(&self, name: &str) -> Result<Value, ReflectionError> {
        self.hierarchy().constant_value(&self.symbol, name)
    }

    pub fn has_constant(&self, name: &str) -> bool {
        self.symbol.has_constant(name)
            || matches!(self.hierarchy().constant_owner(&self.symbol, name), Ok(Some(_)))
    }
}
