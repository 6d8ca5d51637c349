//! Name resolution for class-like references
//!
//! Turns a name as written in a declaration (`Foo`, `Sub\Foo`, `\Foo`) into a
//! fully qualified name, the same way the PHP compiler resolves class names:
//! fully qualified names are taken as-is, imported aliases win over the
//! current namespace, and everything else is prefixed with the namespace.

use super::fqn::{FullyQualifiedName, SEPARATOR};
use serde::Serialize;
use std::collections::HashMap;

/// Names that never denote a class-like symbol
const RESERVED_TYPE_NAMES: &[&str] = &[
    "int", "string", "bool", "float", "array", "mixed", "void", "null", "callable", "iterable",
    "object", "never", "false", "true", "self", "static", "parent",
];

/// How a reference was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NameKind {
    /// `\Foo\Bar`
    FullyQualified,
    /// `Foo\Bar`
    Qualified,
    /// `Bar`
    Unqualified,
}

/// A reference to another symbol, exactly as written in source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NameRef {
    raw: String,
}

impl NameRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into().trim().to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> NameKind {
        if self.raw.starts_with(SEPARATOR) {
            NameKind::FullyQualified
        } else if self.raw.contains(SEPARATOR) {
            NameKind::Qualified
        } else {
            NameKind::Unqualified
        }
    }
}

impl From<&str> for NameRef {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Namespace and imports in effect where a declaration appears
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameContext {
    namespace: Option<Vec<String>>,
    /// Lowercased alias -> fully qualified name
    imports: HashMap<String, FullyQualifiedName>,
}

impl NameContext {
    /// Context of the global namespace without imports
    pub fn global() -> Self {
        Self::default()
    }

    /// Context of a namespace given as `A\B`
    pub fn in_namespace(namespace: &str) -> Self {
        let parts: Vec<String> = namespace
            .trim_matches(SEPARATOR)
            .split(SEPARATOR)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            namespace: if parts.is_empty() { None } else { Some(parts) },
            imports: HashMap::new(),
        }
    }

    /// Register a `use` import. Without an explicit alias the last segment is used.
    pub fn with_import(mut self, name: &str, alias: Option<&str>) -> Self {
        self.add_import(name, alias);
        self
    }

    pub fn add_import(&mut self, name: &str, alias: Option<&str>) {
        let fqn = FullyQualifiedName::new(name);
        let alias = alias
            .map(str::to_string)
            .unwrap_or_else(|| fqn.short_name().to_string());
        self.imports.insert(alias.to_ascii_lowercase(), fqn);
    }

    pub fn namespace(&self) -> Option<&[String]> {
        self.namespace.as_deref()
    }

    pub fn namespace_name(&self) -> String {
        self.namespace
            .as_ref()
            .map(|parts| parts.join("\\"))
            .unwrap_or_default()
    }

    pub fn import(&self, alias: &str) -> Option<&FullyQualifiedName> {
        self.imports.get(&alias.to_ascii_lowercase())
    }
}

/// Resolves [`NameRef`]s into fully qualified names. Side-effect free.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameResolver;

impl NameResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a reference relative to its context.
    ///
    /// Returns `None` when the reference cannot denote a class-like symbol
    /// (scalar type names, `self`/`static`/`parent`, empty input).
    pub fn resolve(&self, name: &NameRef, context: &NameContext) -> Option<FullyQualifiedName> {
        let raw = name.as_str();
        if raw.is_empty() || raw == "\\" {
            return None;
        }

        match name.kind() {
            NameKind::FullyQualified => Some(FullyQualifiedName::new(raw)),
            NameKind::Qualified => {
                let (first, rest) = raw.split_once(SEPARATOR).unwrap_or((raw, ""));

                // `namespace\Foo` is relative to the current namespace
                if first.eq_ignore_ascii_case("namespace") {
                    return Some(FullyQualifiedName::from_parts(context.namespace(), rest));
                }

                if let Some(imported) = context.import(first) {
                    return Some(FullyQualifiedName::new(format!(
                        "{}{}{}",
                        imported, SEPARATOR, rest
                    )));
                }

                Some(FullyQualifiedName::from_parts(context.namespace(), raw))
            }
            NameKind::Unqualified => {
                if is_reserved_type_name(raw) {
                    return None;
                }
                if let Some(imported) = context.import(raw) {
                    return Some(imported.clone());
                }
                Some(FullyQualifiedName::from_parts(context.namespace(), raw))
            }
        }
    }
}

fn is_reserved_type_name(name: &str) -> bool {
    let name = name.trim_start_matches('?');
    RESERVED_TYPE_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}
