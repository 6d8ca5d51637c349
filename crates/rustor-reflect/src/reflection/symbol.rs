//! Per-declaration reflection
//!
//! A [`SymbolReflection`] is built once from a [`Declaration`] and never
//! changes afterwards, so it can be shared between threads behind an `Arc`.
//! Member maps keep declaration order; a later member with the same name
//! replaces the earlier one in its original position.

use super::members::{ConstantReflection, MethodReflection, PropertyReflection};
use crate::declaration::{Declaration, SymbolKind, TraitUse};
use crate::error::ReflectionError;
use crate::name::{FullyQualifiedName, NameRef, NameResolver};
use indexmap::IndexMap;
use std::path::Path;

/// Reflection over one class, interface or trait declaration
#[derive(Debug, Clone)]
pub struct SymbolReflection {
    declaration: Declaration,
    name: FullyQualifiedName,
    /// Keyed by lowercase name, methods are case-insensitive
    methods: IndexMap<String, MethodReflection>,
    properties: IndexMap<String, PropertyReflection>,
    constants: IndexMap<String, ConstantReflection>,
}

impl SymbolReflection {
    pub fn new(declaration: Declaration) -> Self {
        let name = declaration.fully_qualified_name();

        let mut methods = IndexMap::new();
        for method in &declaration.methods {
            methods.insert(
                method.name.to_lowercase(),
                MethodReflection::new(method.clone(), name.clone()),
            );
        }

        let mut properties = IndexMap::new();
        for property in &declaration.properties {
            properties.insert(
                property.name.clone(),
                PropertyReflection::new(property.clone(), name.clone()),
            );
        }

        let mut constants = IndexMap::new();
        for constant in &declaration.constants {
            constants.insert(
                constant.name.clone(),
                ConstantReflection::new(constant.clone(), name.clone()),
            );
        }

        Self {
            declaration,
            name,
            methods,
            properties,
            constants,
        }
    }

    pub fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    pub fn name(&self) -> &FullyQualifiedName {
        &self.name
    }

    pub fn short_name(&self) -> &str {
        &self.declaration.short_name
    }

    pub fn namespace_name(&self) -> String {
        self.declaration.context.namespace_name()
    }

    pub fn in_namespace(&self) -> bool {
        self.declaration.namespace().is_some_and(|ns| !ns.is_empty())
    }

    pub fn kind(&self) -> SymbolKind {
        self.declaration.kind
    }

    pub fn is_class(&self) -> bool {
        self.kind() == SymbolKind::Class
    }

    pub fn is_interface(&self) -> bool {
        self.kind() == SymbolKind::Interface
    }

    pub fn is_trait(&self) -> bool {
        self.kind() == SymbolKind::Trait
    }

    pub fn is_abstract(&self) -> bool {
        match self.kind() {
            SymbolKind::Class => self.declaration.modifiers.is_abstract,
            // Interfaces are implicitly abstract
            SymbolKind::Interface => true,
            SymbolKind::Trait => false,
        }
    }

    pub fn is_final(&self) -> bool {
        self.kind() == SymbolKind::Class && self.declaration.modifiers.is_final
    }

    /// Not abstract, not an interface, not a trait
    pub fn is_instantiable(&self) -> bool {
        match self.kind() {
            SymbolKind::Class => !self.declaration.modifiers.is_abstract,
            SymbolKind::Interface | SymbolKind::Trait => false,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.declaration.location.is_internal
    }

    pub fn is_user_defined(&self) -> bool {
        !self.is_internal()
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.declaration.location.file.as_deref()
    }

    pub fn start_line(&self) -> usize {
        self.declaration.location.start_line
    }

    pub fn end_line(&self) -> usize {
        self.declaration.location.end_line
    }

    pub fn doc_comment(&self) -> Option<&str> {
        self.declaration.location.doc_comment.as_deref()
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodReflection> {
        self.methods.values()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(&name.to_lowercase())
    }

    /// Look up a declared method (case-insensitive)
    pub fn method(&self, name: &str) -> Result<&MethodReflection, ReflectionError> {
        self.methods
            .get(&name.to_lowercase())
            .ok_or_else(|| ReflectionError::MethodNotFound {
                class: self.name.to_string(),
                method: name.to_string(),
            })
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyReflection> {
        self.properties.values()
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name.trim_start_matches('$'))
    }

    pub fn property(&self, name: &str) -> Result<&PropertyReflection, ReflectionError> {
        self.properties
            .get(name.trim_start_matches('$'))
            .ok_or_else(|| ReflectionError::PropertyNotFound {
                class: self.name.to_string(),
                property: name.trim_start_matches('$').to_string(),
            })
    }

    pub fn constants(&self) -> impl Iterator<Item = &ConstantReflection> {
        self.constants.values()
    }

    pub fn has_constant(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }

    pub fn constant(&self, name: &str) -> Result<&ConstantReflection, ReflectionError> {
        self.constants
            .get(name)
            .ok_or_else(|| ReflectionError::ConstantNotFound {
                class: self.name.to_string(),
                constant: name.to_string(),
            })
    }

    /// Resolve a reference written inside this declaration
    pub fn resolve_reference(&self, reference: &NameRef) -> Result<FullyQualifiedName, ReflectionError> {
        NameResolver::new()
            .resolve(reference, &self.declaration.context)
            .ok_or_else(|| ReflectionError::ClassNotFound(reference.as_str().to_string()))
    }

    /// Resolved name of the parent class, if the declaration has one
    pub fn parent_name(&self) -> Result<Option<FullyQualifiedName>, ReflectionError> {
        match self.kind() {
            SymbolKind::Class => self
                .declaration
                .parent
                .as_ref()
                .map(|parent| self.resolve_reference(parent))
                .transpose(),
            SymbolKind::Interface | SymbolKind::Trait => Ok(None),
        }
    }

    /// Resolved names of the interfaces this declaration names directly:
    /// `implements` for classes, `extends` for interfaces
    pub fn declared_interface_names(&self) -> Result<Vec<FullyQualifiedName>, ReflectionError> {
        match self.kind() {
            SymbolKind::Class | SymbolKind::Interface => self
                .declaration
                .interfaces
                .iter()
                .map(|interface| self.resolve_reference(interface))
                .collect(),
            SymbolKind::Trait => Ok(Vec::new()),
        }
    }

    pub fn trait_uses(&self) -> &[TraitUse] {
        &self.declaration.trait_uses
    }

    /// Resolved names of every used trait, in declaration order
    pub fn declared_trait_names(&self) -> Result<Vec<FullyQualifiedName>, ReflectionError> {
        self.declaration
            .trait_uses
            .iter()
            .flat_map(|statement| statement.trait_names.iter())
            .map(|name| self.resolve_reference(name))
            .collect()
    }
}
