//! Symbol names and name resolution
//!
//! This module provides fully qualified names plus the resolver that turns
//! references found in declarations (parent, interfaces, traits) into them.

pub mod fqn;
pub mod resolver;

pub use fqn::FullyQualifiedName;
pub use resolver::{NameContext, NameKind, NameRef, NameResolver};
