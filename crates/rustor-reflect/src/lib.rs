//! rustor-reflect: static reflection over PHP classes, interfaces and traits
//!
//! Answers the questions PHP's runtime reflection answers (parent chain,
//! implemented interfaces, used traits, members, constant values) from
//! source code alone, without loading or running it:
//!
//! - Name resolution against the enclosing namespace and `use` imports
//! - Declaration extraction from PHP source with mago
//! - Pluggable source locators (directories, composer PSR-4, builtins)
//! - Lazy, memoized evaluation of constant and property initializers
//!
//! # Example
//!
//! ```no_run
//! use rustor_reflect::{BuiltinSourceLocator, DefaultReflector, Reflector, StringSourceLocator};
//!
//! let source = "<?php namespace App; class Users implements \\Countable {}";
//! let reflector = DefaultReflector::new()
//!     .with_locator(BuiltinSourceLocator::new())
//!     .with_locator(StringSourceLocator::new(source).unwrap());
//!
//! let users = reflector.reflect_class("App\\Users").unwrap();
//! assert!(users.implements_interface("Countable").unwrap());
//! ```

pub mod config;
pub mod declaration;
pub mod error;
pub mod evaluate;
pub mod extract;
pub mod logging;
pub mod name;
pub mod reflection;
pub mod reflector;

pub use config::ReflectorConfig;
pub use declaration::{Declaration, SymbolKind, Visibility};
pub use error::ReflectionError;
pub use evaluate::{ConstantEvaluator, DefaultEvaluator, EvaluationError, Value};
pub use extract::parse_source;
pub use name::{FullyQualifiedName, NameContext, NameRef, NameResolver};
pub use reflection::{
    ClassReflection, ConstantReflection, HierarchyResolver, MethodReflection, PropertyReflection,
    SymbolReflection,
};
pub use reflector::{
    BuiltinSourceLocator, DeclarationLocator, DefaultReflector, DirectorySourceLocator,
    Psr4SourceLocator, Reflector, SourceLocator, StringSourceLocator,
};
