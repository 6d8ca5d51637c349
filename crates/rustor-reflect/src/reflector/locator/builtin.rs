//! Internal classes and interfaces provided by the PHP engine

use super::{DeclarationIndex, SourceLocator};
use crate::declaration::{
    ConstantDecl, Declaration, MethodDecl, ParameterDecl, PropertyDecl, SymbolKind, Visibility,
};
use crate::error::ReflectionError;
use crate::name::FullyQualifiedName;

/// Locator over a built-in table of engine symbols, all marked internal
#[derive(Debug, Clone)]
pub struct BuiltinSourceLocator {
    index: DeclarationIndex,
}

impl Default for BuiltinSourceLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinSourceLocator {
    pub fn new() -> Self {
        Self {
            index: builtin_declarations().into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.len() == 0
    }
}

impl SourceLocator for BuiltinSourceLocator {
    fn name(&self) -> &str {
        "builtin"
    }

    fn locate(&self, name: &FullyQualifiedName) -> Result<Option<Declaration>, ReflectionError> {
        Ok(self.index.get(name).cloned())
    }

    fn symbols(&self) -> Result<Vec<FullyQualifiedName>, ReflectionError> {
        Ok(self.index.names())
    }
}

fn builtin_declarations() -> Vec<Declaration> {
    // Format: (name, kind, parent, interfaces, final)
    let hierarchy: &[(&str, SymbolKind, Option<&str>, &[&str], bool)] = &[
        ("Traversable", SymbolKind::Interface, None, &[], false),
        ("Iterator", SymbolKind::Interface, None, &["Traversable"], false),
        ("IteratorAggregate", SymbolKind::Interface, None, &["Traversable"], false),
        ("SeekableIterator", SymbolKind::Interface, None, &["Iterator"], false),
        ("ArrayAccess", SymbolKind::Interface, None, &[], false),
        ("Countable", SymbolKind::Interface, None, &[], false),
        ("Serializable", SymbolKind::Interface, None, &[], false),
        ("JsonSerializable", SymbolKind::Interface, None, &[], false),
        ("Stringable", SymbolKind::Interface, None, &[], false),
        ("Throwable", SymbolKind::Interface, None, &["Stringable"], false),
        ("UnitEnum", SymbolKind::Interface, None, &[], false),
        ("BackedEnum", SymbolKind::Interface, None, &["UnitEnum"], false),
        ("stdClass", SymbolKind::Class, None, &[], false),
        ("Closure", SymbolKind::Class, None, &[], true),
        ("Generator", SymbolKind::Class, None, &["Iterator"], true),
        (
            "ArrayIterator",
            SymbolKind::Class,
            None,
            &["SeekableIterator", "ArrayAccess", "Serializable", "Countable"],
            false,
        ),
        (
            "ArrayObject",
            SymbolKind::Class,
            None,
            &["IteratorAggregate", "ArrayAccess", "Serializable", "Countable"],
            false,
        ),
        ("DateTime", SymbolKind::Class, None, &["DateTimeInterface"], false),
        ("DateTimeImmutable", SymbolKind::Class, None, &["DateTimeInterface"], false),
        ("DateTimeZone", SymbolKind::Class, None, &[], false),
        ("DateInterval", SymbolKind::Class, None, &[], false),
        ("Exception", SymbolKind::Class, None, &["Throwable"], false),
        ("Error", SymbolKind::Class, None, &["Throwable"], false),
        ("ErrorException", SymbolKind::Class, Some("Exception"), &[], false),
        ("TypeError", SymbolKind::Class, Some("Error"), &[], false),
        ("ArgumentCountError", SymbolKind::Class, Some("TypeError"), &[], false),
        ("ValueError", SymbolKind::Class, Some("Error"), &[], false),
        ("ArithmeticError", SymbolKind::Class, Some("Error"), &[], false),
        ("DivisionByZeroError", SymbolKind::Class, Some("ArithmeticError"), &[], false),
        ("RuntimeException", SymbolKind::Class, Some("Exception"), &[], false),
        ("LogicException", SymbolKind::Class, Some("Exception"), &[], false),
        ("InvalidArgumentException", SymbolKind::Class, Some("LogicException"), &[], false),
        ("DomainException", SymbolKind::Class, Some("LogicException"), &[], false),
        ("LengthException", SymbolKind::Class, Some("LogicException"), &[], false),
        ("OutOfRangeException", SymbolKind::Class, Some("LogicException"), &[], false),
        ("BadFunctionCallException", SymbolKind::Class, Some("LogicException"), &[], false),
        ("BadMethodCallException", SymbolKind::Class, Some("BadFunctionCallException"), &[], false),
        ("OutOfBoundsException", SymbolKind::Class, Some("RuntimeException"), &[], false),
        ("UnexpectedValueException", SymbolKind::Class, Some("RuntimeException"), &[], false),
        ("RangeException", SymbolKind::Class, Some("RuntimeException"), &[], false),
        ("OverflowException", SymbolKind::Class, Some("RuntimeException"), &[], false),
        ("UnderflowException", SymbolKind::Class, Some("RuntimeException"), &[], false),
        ("JsonException", SymbolKind::Class, Some("Exception"), &[], false),
    ];

    // Format: (owner, methods); interface methods are abstract
    let methods: &[(&str, &[&str])] = &[
        ("Iterator", &["current", "key", "next", "rewind", "valid"]),
        ("IteratorAggregate", &["getIterator"]),
        ("SeekableIterator", &["seek"]),
        ("ArrayAccess", &["offsetExists", "offsetGet", "offsetSet", "offsetUnset"]),
        ("Countable", &["count"]),
        ("Serializable", &["serialize", "unserialize"]),
        ("JsonSerializable", &["jsonSerialize"]),
        ("Stringable", &["__toString"]),
        ("UnitEnum", &["cases"]),
        ("BackedEnum", &["from", "tryFrom"]),
        ("Generator", &["current", "key", "next", "rewind", "valid", "send", "getReturn"]),
        ("Closure", &["bind", "bindTo", "call", "fromCallable"]),
    ];

    let mut declarations: Vec<Declaration> = hierarchy
        .iter()
        .map(|(name, kind, parent, interfaces, is_final)| {
            let mut decl = Declaration::named(*kind, name).with_final(*is_final).internal();
            if let Some(parent) = parent {
                decl = decl.with_parent(&format!("\\{}", parent));
            }
            for interface in *interfaces {
                decl = decl.with_interface(&format!("\\{}", interface));
            }
            if let Some((_, names)) = methods.iter().find(|(owner, _)| owner == name) {
                let is_interface = *kind == SymbolKind::Interface;
                for method in *names {
                    decl = decl.with_method(MethodDecl::new(*method).with_abstract(is_interface));
                }
            }
            decl
        })
        .collect();

    for decl in declarations.iter_mut() {
        if decl.short_name == "Exception" || decl.short_name == "Error" {
            add_throwable_members(decl);
        }
    }

    declarations.push(
        Declaration::named(SymbolKind::Interface, "DateTimeInterface")
            .internal()
            .with_constant(ConstantDecl::new("ATOM", "'Y-m-d\\TH:i:sP'"))
            .with_constant(ConstantDecl::new("ISO8601", "'Y-m-d\\TH:i:sO'"))
            .with_constant(ConstantDecl::new("RFC3339", "'Y-m-d\\TH:i:sP'"))
            .with_method(MethodDecl::new("format").with_abstract(true))
            .with_method(MethodDecl::new("getTimestamp").with_abstract(true))
            .with_method(MethodDecl::new("getTimezone").with_abstract(true)),
    );

    declarations
}

/// Members shared by `Exception` and `Error`
fn add_throwable_members(decl: &mut Declaration) {
    let protected = |name: &str, default: &str| {
        PropertyDecl::new(name)
            .with_visibility(Visibility::Protected)
            .with_default(default)
    };
    decl.properties.extend([
        protected("message", "''"),
        protected("code", "0"),
        protected("file", "''"),
        protected("line", "0"),
    ]);

    decl.methods.push(
        MethodDecl::new("__construct")
            .with_parameter(ParameterDecl::new("message").with_optional(true))
            .with_parameter(ParameterDecl::new("code").with_optional(true))
            .with_parameter(ParameterDecl::new("previous").with_optional(true)),
    );
    for name in [
        "getMessage",
        "getCode",
        "getFile",
        "getLine",
        "getTrace",
        "getPrevious",
        "getTraceAsString",
    ] {
        let mut method = MethodDecl::new(name);
        method.is_final = true;
        decl.methods.push(method);
    }
    decl.methods.push(MethodDecl::new("__toString"));

    // Throwables cannot be cloned
    let mut clone = MethodDecl::new("__clone").with_visibility(Visibility::Private);
    clone.is_final = true;
    decl.methods.push(clone);
}
