//! Parser-independent description of a class-like declaration
//!
//! A [`Declaration`] holds everything the reflection layer needs about one
//! class, interface or trait. Name references (parent, interfaces, traits)
//! are kept as written together with the [`NameContext`] they appear in, and
//! are resolved on demand.

use crate::name::{FullyQualifiedName, NameContext, NameRef};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Kind of class-like structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Class,
    Interface,
    Trait,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Trait => "trait",
        };
        f.write_str(s)
    }
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        };
        f.write_str(s)
    }
}

/// Class-level modifiers (meaningful only for classes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Modifiers {
    pub is_abstract: bool,
    pub is_final: bool,
}

/// An unevaluated initializer expression, kept as source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Initializer(String);

impl Initializer {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into().trim().to_string())
    }

    pub fn source(&self) -> &str {
        &self.0
    }
}

/// Where a declaration comes from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: Option<PathBuf>,
    pub start_line: usize,
    pub end_line: usize,
    /// Provided by the engine rather than user code
    pub is_internal: bool,
    pub doc_comment: Option<String>,
}

/// A method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDecl {
    pub name: String,
    pub is_optional: bool,
    pub is_variadic: bool,
    pub is_by_reference: bool,
}

impl ParameterDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim_start_matches('$').to_string(),
            is_optional: false,
            is_variadic: false,
            is_by_reference: false,
        }
    }

    pub fn with_optional(mut self, is_optional: bool) -> Self {
        self.is_optional = is_optional;
        self
    }

    pub fn with_variadic(mut self, is_variadic: bool) -> Self {
        self.is_variadic = is_variadic;
        self
    }
}

/// A declared method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub parameters: Vec<ParameterDecl>,
    pub start_line: usize,
    pub end_line: usize,
    pub doc_comment: Option<String>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            is_abstract: false,
            is_final: false,
            parameters: Vec::new(),
            start_line: 0,
            end_line: 0,
            doc_comment: None,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterDecl) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// A declared property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDecl {
    /// Name without the leading `$`
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_readonly: bool,
    pub type_hint: Option<String>,
    pub default: Option<Initializer>,
}

impl PropertyDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim_start_matches('$').to_string(),
            visibility: Visibility::Public,
            is_static: false,
            is_readonly: false,
            type_hint: None,
            default: None,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_type(mut self, type_hint: impl Into<String>) -> Self {
        self.type_hint = Some(type_hint.into());
        self
    }

    pub fn with_default(mut self, source: impl Into<String>) -> Self {
        self.default = Some(Initializer::new(source));
        self
    }
}

/// A declared class constant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstantDecl {
    pub name: String,
    pub visibility: Visibility,
    pub is_final: bool,
    pub initializer: Initializer,
}

impl ConstantDecl {
    pub fn new(name: impl Into<String>, initializer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_final: false,
            initializer: Initializer::new(initializer),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// One adaptation inside a trait-use block
///
/// `A::m as protected x;` gives `from_trait = A`, `method = m`,
/// `visibility = protected`, `alias = x`. `A::m insteadof B;` records `B`
/// in `insteadof` and carries no alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraitAdaptation {
    pub from_trait: Option<NameRef>,
    pub method: String,
    pub alias: Option<String>,
    pub visibility: Option<Visibility>,
    pub insteadof: Vec<NameRef>,
}

impl TraitAdaptation {
    pub fn alias(from_trait: Option<&str>, method: &str, alias: &str) -> Self {
        Self {
            from_trait: from_trait.map(NameRef::new),
            method: method.to_string(),
            alias: Some(alias.to_string()),
            visibility: None,
            insteadof: Vec::new(),
        }
    }
}

/// A `use TraitA, TraitB { ... }` statement inside a class body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraitUse {
    pub trait_names: Vec<NameRef>,
    pub adaptations: Vec<TraitAdaptation>,
}

impl TraitUse {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            trait_names: names.into_iter().map(|n| NameRef::new(n.as_ref())).collect(),
            adaptations: Vec::new(),
        }
    }

    pub fn with_adaptation(mut self, adaptation: TraitAdaptation) -> Self {
        self.adaptations.push(adaptation);
        self
    }
}

/// Normalized view of one class, interface or trait
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub kind: SymbolKind,
    pub short_name: String,
    #[serde(skip)]
    pub context: NameContext,
    pub modifiers: Modifiers,
    /// `extends` of a class
    pub parent: Option<NameRef>,
    /// `implements` of a class, `extends` of an interface
    pub interfaces: Vec<NameRef>,
    pub trait_uses: Vec<TraitUse>,
    pub methods: Vec<MethodDecl>,
    pub properties: Vec<PropertyDecl>,
    pub constants: Vec<ConstantDecl>,
    pub location: SourceLocation,
}

impl Declaration {
    pub fn new(kind: SymbolKind, short_name: impl Into<String>, context: NameContext) -> Self {
        Self {
            kind,
            short_name: short_name.into(),
            context,
            modifiers: Modifiers::default(),
            parent: None,
            interfaces: Vec::new(),
            trait_uses: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            constants: Vec::new(),
            location: SourceLocation::default(),
        }
    }

    /// Build a declaration from a fully qualified name, e.g. `App\Models\User`
    pub fn named(kind: SymbolKind, fqn: &str) -> Self {
        let fqn = FullyQualifiedName::new(fqn);
        let context = NameContext::in_namespace(fqn.namespace_name());
        Self::new(kind, fqn.short_name(), context)
    }

    pub fn class(fqn: &str) -> Self {
        Self::named(SymbolKind::Class, fqn)
    }

    pub fn interface(fqn: &str) -> Self {
        Self::named(SymbolKind::Interface, fqn)
    }

    pub fn trait_(fqn: &str) -> Self {
        Self::named(SymbolKind::Trait, fqn)
    }

    /// `namespace\short_name`, or the short name in the global namespace
    pub fn fully_qualified_name(&self) -> FullyQualifiedName {
        FullyQualifiedName::from_parts(self.context.namespace(), &self.short_name)
    }

    pub fn namespace(&self) -> Option<&[String]> {
        self.context.namespace()
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.modifiers.is_abstract = is_abstract;
        self
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.modifiers.is_final = is_final;
        self
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(NameRef::new(parent));
        self
    }

    pub fn with_interface(mut self, interface: &str) -> Self {
        self.interfaces.push(NameRef::new(interface));
        self
    }

    pub fn with_trait_use(mut self, trait_use: TraitUse) -> Self {
        self.trait_uses.push(trait_use);
        self
    }

    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_constant(mut self, constant: ConstantDecl) -> Self {
        self.constants.push(constant);
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn with_context(mut self, context: NameContext) -> Self {
        self.context = context;
        self
    }

    pub fn internal(mut self) -> Self {
        self.location.is_internal = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_qualified_name() {
        let decl = Declaration::new(
            SymbolKind::Class,
            "User",
            NameContext::in_namespace("App\\Models"),
        );
        assert_eq!(decl.fully_qualified_name().as_str(), "App\\Models\\User");

        let global = Declaration::new(SymbolKind::Class, "User", NameContext::global());
        assert_eq!(global.fully_qualified_name().as_str(), "User");
    }

    #[test]
    fn test_named_splits_namespace() {
        let decl = Declaration::interface("App\\Contracts\\Shape");
        assert_eq!(decl.short_name, "Shape");
        assert_eq!(
            decl.namespace(),
            Some(&["App".to_string(), "Contracts".to_string()][..])
        );
    }

    #[test]
    fn test_property_name_strips_dollar() {
        let prop = PropertyDecl::new("$count").with_default("0");
        assert_eq!(prop.name, "count");
        assert_eq!(prop.default.as_ref().map(|d| d.source()), Some("0"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(SymbolKind::Trait.to_string(), "trait");
        assert_eq!(Visibility::Protected.to_string(), "protected");
    }
}
