//! Reflection objects and hierarchy resolution

pub mod class;
pub mod hierarchy;
pub mod members;
pub mod symbol;

pub use class::ClassReflection;
pub use hierarchy::{HierarchyResolver, InterfaceSet};
pub use members::{ConstantReflection, MethodReflection, PropertyReflection};
pub use symbol::SymbolReflection;
