//! Hierarchy resolution
//!
//! Walks the graph formed by `extends`, `implements` and trait `use`
//! references, fetching related symbols through a [`Reflector`]. Nothing here
//! is cached: every derived view is recomputed from the immutable
//! [`SymbolReflection`]s, so results never go stale.

use super::members::{ConstantReflection, MethodReflection, PropertyReflection};
use super::symbol::SymbolReflection;
use crate::declaration::{SymbolKind, Visibility};
use crate::error::ReflectionError;
use crate::evaluate::{ConstantLookup, EvaluationContext, EvaluationError, Value};
use crate::logging;
use crate::name::FullyQualifiedName;
use crate::reflector::Reflector;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;

/// Interfaces keyed by fully qualified name, in discovery order
pub type InterfaceSet = IndexMap<FullyQualifiedName, Arc<SymbolReflection>>;

/// Canonical marker interface for iterable objects
const TRAVERSABLE: &str = "Traversable";

/// Computes inheritance chains, interface closures and trait tables
pub struct HierarchyResolver<'r> {
    reflector: &'r dyn Reflector,
    max_depth: usize,
}

impl<'r> HierarchyResolver<'r> {
    pub fn new(reflector: &'r dyn Reflector) -> Self {
        Self {
            reflector,
            max_depth: reflector.max_depth(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn reflector(&self) -> &'r dyn Reflector {
        self.reflector
    }

    /// Direct parent class, or `None` for an inheritance root
    pub fn parent(
        &self,
        symbol: &SymbolReflection,
    ) -> Result<Option<Arc<SymbolReflection>>, ReflectionError> {
        let Some(name) = symbol.parent_name()? else {
            return Ok(None);
        };
        let parent = self.reflector.reflect(&name)?;
        match parent.kind() {
            SymbolKind::Class => Ok(Some(parent)),
            kind => Err(ReflectionError::NotAClass {
                name: parent.name().to_string(),
                kind,
            }),
        }
    }

    /// Ancestors from the inheritance root down to `symbol` itself (last)
    pub fn inheritance_chain(
        &self,
        symbol: &Arc<SymbolReflection>,
    ) -> Result<Vec<Arc<SymbolReflection>>, ReflectionError> {
        let mut chain = vec![Arc::clone(symbol)];
        let mut visited: HashSet<FullyQualifiedName> = HashSet::new();
        visited.insert(symbol.name().clone());

        let mut current = Arc::clone(symbol);
        while let Some(parent) = self.parent(&current)? {
            if !visited.insert(parent.name().clone()) {
                let mut names: Vec<String> =
                    chain.iter().map(|s| s.name().to_string()).collect();
                names.push(parent.name().to_string());
                logging::log_cycle(&names);
                return Err(ReflectionError::CyclicInheritance { chain: names });
            }
            if chain.len() >= self.max_depth {
                return Err(ReflectionError::DepthExceeded {
                    name: symbol.name().to_string(),
                    max_depth: self.max_depth,
                });
            }
            chain.push(Arc::clone(&parent));
            current = parent;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Ancestors strictly above `symbol`, nearest first
    pub fn ancestors(
        &self,
        symbol: &Arc<SymbolReflection>,
    ) -> Result<Vec<Arc<SymbolReflection>>, ReflectionError> {
        let mut chain = self.inheritance_chain(symbol)?;
        chain.pop();
        chain.reverse();
        Ok(chain)
    }

    /// `interface` itself plus every interface it extends, transitively
    pub fn interface_hierarchy(
        &self,
        interface: &Arc<SymbolReflection>,
    ) -> Result<InterfaceSet, ReflectionError> {
        let mut set = InterfaceSet::new();
        let mut path = Vec::new();
        self.flatten_interface(interface, &mut path, &mut set)?;
        Ok(set)
    }

    fn flatten_interface(
        &self,
        interface: &Arc<SymbolReflection>,
        path: &mut Vec<FullyQualifiedName>,
        set: &mut InterfaceSet,
    ) -> Result<(), ReflectionError> {
        if !interface.is_interface() {
            return Err(ReflectionError::NotAnInterface {
                name: interface.name().to_string(),
                kind: interface.kind(),
            });
        }
        if path.contains(interface.name()) {
            let mut names: Vec<String> = path.iter().map(|n| n.to_string()).collect();
            names.push(interface.name().to_string());
            logging::log_cycle(&names);
            return Err(ReflectionError::CyclicInheritance { chain: names });
        }
        // Diamonds reach the same interface twice; its subtree is already in the set
        if set.contains_key(interface.name()) {
            return Ok(());
        }
        if path.len() >= self.max_depth {
            return Err(ReflectionError::DepthExceeded {
                name: interface.name().to_string(),
                max_depth: self.max_depth,
            });
        }

        set.insert(interface.name().clone(), Arc::clone(interface));
        path.push(interface.name().clone());
        for name in interface.declared_interface_names()? {
            let extended = self.reflector.reflect(&name)?;
            self.flatten_interface(&extended, path, set)?;
        }
        path.pop();
        Ok(())
    }

    /// Interfaces contributed by `symbol`'s own declaration, closed over
    /// interface inheritance but not over parent classes
    pub fn own_interfaces(&self, symbol: &SymbolReflection) -> Result<InterfaceSet, ReflectionError> {
        let mut set = InterfaceSet::new();
        match symbol.kind() {
            SymbolKind::Class | SymbolKind::Interface => {
                for name in symbol.declared_interface_names()? {
                    let interface = self.reflector.reflect(&name)?;
                    let mut path = Vec::new();
                    if symbol.is_interface() {
                        path.push(symbol.name().clone());
                    }
                    self.flatten_interface(&interface, &mut path, &mut set)?;
                }
            }
            SymbolKind::Trait => {}
        }
        Ok(set)
    }

    /// Every interface `symbol` implements, including those of its ancestors,
    /// ordered root to leaf
    pub fn interfaces(&self, symbol: &Arc<SymbolReflection>) -> Result<InterfaceSet, ReflectionError> {
        let mut set = InterfaceSet::new();
        for member in self.inheritance_chain(symbol)? {
            for (name, interface) in self.own_interfaces(&member)? {
                set.insert(name, interface);
            }
        }
        Ok(set)
    }

    pub fn interface_names(
        &self,
        symbol: &Arc<SymbolReflection>,
    ) -> Result<Vec<FullyQualifiedName>, ReflectionError> {
        Ok(self.interfaces(symbol)?.into_keys().collect())
    }

    pub fn implements_interface(
        &self,
        symbol: &Arc<SymbolReflection>,
        name: &str,
    ) -> Result<bool, ReflectionError> {
        let target = FullyQualifiedName::new(name);
        Ok(self.interfaces(symbol)?.contains_key(&target))
    }

    /// Whether `name` is an ancestor class; `symbol` itself does not count
    pub fn is_subclass_of(
        &self,
        symbol: &Arc<SymbolReflection>,
        name: &str,
    ) -> Result<bool, ReflectionError> {
        Ok(self
            .ancestors(symbol)?
            .iter()
            .any(|ancestor| ancestor.name().matches(name)))
    }

    /// Instantiable, with no `__clone` or a public one
    pub fn is_cloneable(&self, symbol: &Arc<SymbolReflection>) -> Result<bool, ReflectionError> {
        if !symbol.is_instantiable() {
            return Ok(false);
        }
        let methods = self.all_methods(symbol)?;
        Ok(methods
            .get("__clone")
            .map_or(true, |method| method.is_public()))
    }

    pub fn is_iterateable(&self, symbol: &Arc<SymbolReflection>) -> Result<bool, ReflectionError> {
        if !symbol.is_instantiable() {
            return Ok(false);
        }
        self.implements_interface(symbol, TRAVERSABLE)
    }

    /// Static instance check: whether an object of the given class would be
    /// an instance of `symbol`
    pub fn is_instance(
        &self,
        symbol: &Arc<SymbolReflection>,
        value: &Value,
    ) -> Result<bool, ReflectionError> {
        let Value::Object(class) = value else {
            return Err(ReflectionError::InvalidArgument(format!(
                "expected an object, got {}",
                value.type_name()
            )));
        };
        if class == symbol.name() {
            return Ok(true);
        }
        let object_class = self.reflector.reflect(class)?;
        if symbol.is_interface() {
            return self.implements_interface(&object_class, symbol.name().as_str());
        }
        self.is_subclass_of(&object_class, symbol.name().as_str())
    }

    /// Used traits in declaration order
    pub fn traits(&self, symbol: &SymbolReflection) -> Result<Vec<Arc<SymbolReflection>>, ReflectionError> {
        symbol
            .declared_trait_names()?
            .iter()
            .map(|name| self.reflector.reflect(name))
            .collect()
    }

    pub fn trait_names(&self, symbol: &SymbolReflection) -> Result<Vec<FullyQualifiedName>, ReflectionError> {
        symbol.declared_trait_names()
    }

    /// Alias name to `TraitFQN::method`, last alias wins
    pub fn trait_aliases(&self, symbol: &SymbolReflection) -> Result<IndexMap<String, String>, ReflectionError> {
        let mut aliases = IndexMap::new();
        for statement in symbol.trait_uses() {
            for adaptation in &statement.adaptations {
                let Some(alias) = adaptation.alias.as_deref().filter(|a| !a.is_empty()) else {
                    continue;
                };
                let Some(source) = adaptation
                    .from_trait
                    .as_ref()
                    .or_else(|| statement.trait_names.first())
                else {
                    continue;
                };
                let source = symbol.resolve_reference(source)?;
                aliases.insert(alias.to_string(), format!("{}::{}", source, adaptation.method));
            }
        }
        Ok(aliases)
    }

    /// Methods visible on `symbol`: own, then trait, then inherited. Keys
    /// are lowercase; the first definition found wins.
    pub fn all_methods(
        &self,
        symbol: &Arc<SymbolReflection>,
    ) -> Result<IndexMap<String, MethodReflection>, ReflectionError> {
        let mut methods = IndexMap::new();
        let mut chain = self.inheritance_chain(symbol)?;
        chain.reverse();
        for class in &chain {
            for method in class.methods() {
                methods
                    .entry(method.name().to_lowercase())
                    .or_insert_with(|| method.clone());
            }
            let mut seen = HashSet::new();
            self.collect_trait_methods(class, &mut seen, &mut methods)?;
        }
        Ok(methods)
    }

    fn collect_trait_methods(
        &self,
        symbol: &SymbolReflection,
        seen: &mut HashSet<FullyQualifiedName>,
        methods: &mut IndexMap<String, MethodReflection>,
    ) -> Result<(), ReflectionError> {
        for used in self.traits(symbol)? {
            if !seen.insert(used.name().clone()) {
                continue;
            }
            if seen.len() > self.max_depth {
                return Err(ReflectionError::DepthExceeded {
                    name: symbol.name().to_string(),
                    max_depth: self.max_depth,
                });
            }
            for method in used.methods() {
                methods
                    .entry(method.name().to_lowercase())
                    .or_insert_with(|| method.clone());
            }
            self.collect_trait_methods(&used, seen, methods)?;
        }
        Ok(())
    }

    /// Properties visible on `symbol`: own, then trait, then non-private inherited
    pub fn all_properties(
        &self,
        symbol: &Arc<SymbolReflection>,
    ) -> Result<IndexMap<String, PropertyReflection>, ReflectionError> {
        let mut properties = IndexMap::new();
        let mut chain = self.inheritance_chain(symbol)?;
        chain.reverse();
        for (depth, class) in chain.iter().enumerate() {
            let inherited = depth > 0;
            let mut owned: Vec<PropertyReflection> = class.properties().cloned().collect();
            for used in self.traits(class)? {
                owned.extend(used.properties().cloned());
            }
            for property in owned {
                if inherited && property.visibility() == Visibility::Private {
                    continue;
                }
                properties
                    .entry(property.name().to_string())
                    .or_insert(property);
            }
        }
        Ok(properties)
    }

    /// Symbol declaring the constant `name` as seen from `symbol`: the class
    /// chain first, then its interfaces
    pub fn constant_owner(
        &self,
        symbol: &Arc<SymbolReflection>,
        name: &str,
    ) -> Result<Option<Arc<SymbolReflection>>, ReflectionError> {
        let mut chain = self.inheritance_chain(symbol)?;
        chain.reverse();
        if let Some(owner) = chain.into_iter().find(|class| class.has_constant(name)) {
            return Ok(Some(owner));
        }
        Ok(self
            .interfaces(symbol)?
            .into_values()
            .find(|interface| interface.has_constant(name)))
    }

    /// Constants visible on `symbol` with their declaring symbol, own first
    pub fn all_constants(
        &self,
        symbol: &Arc<SymbolReflection>,
    ) -> Result<IndexMap<String, Arc<SymbolReflection>>, ReflectionError> {
        let mut constants = IndexMap::new();
        let mut chain = self.inheritance_chain(symbol)?;
        chain.reverse();
        let interfaces = self.interfaces(symbol)?;
        for owner in chain.into_iter().chain(interfaces.into_values()) {
            for constant in owner.constants() {
                constants
                    .entry(constant.name().to_string())
                    .or_insert_with(|| Arc::clone(&owner));
            }
        }
        Ok(constants)
    }

    /// Evaluated value of the constant `name`, inherited ones included
    pub fn constant_value(
        &self,
        symbol: &Arc<SymbolReflection>,
        name: &str,
    ) -> Result<Value, ReflectionError> {
        let owner = self
            .constant_owner(symbol, name)?
            .ok_or_else(|| ReflectionError::ConstantNotFound {
                class: symbol.name().to_string(),
                constant: name.to_string(),
            })?;
        let constant = owner.constant(name)?;
        ConstantResolver::new(self)
            .evaluate(&owner, constant)
            .map_err(|source| ReflectionError::Evaluation {
                class: owner.name().to_string(),
                name: name.to_string(),
                source,
            })
    }

    /// Every visible constant with its evaluation result; a failing
    /// initializer only affects its own entry
    pub fn constant_values(
        &self,
        symbol: &Arc<SymbolReflection>,
    ) -> Result<IndexMap<String, Result<Value, EvaluationError>>, ReflectionError> {
        let resolver = ConstantResolver::new(self);
        let mut values = IndexMap::new();
        for (name, owner) in self.all_constants(symbol)? {
            let constant = owner.constant(&name)?;
            values.insert(name, resolver.evaluate(&owner, constant));
        }
        Ok(values)
    }

    /// Compile-time defaults of every visible property that has one
    pub fn default_properties(
        &self,
        symbol: &Arc<SymbolReflection>,
    ) -> Result<IndexMap<String, Value>, ReflectionError> {
        let resolver = ConstantResolver::new(self);
        let mut defaults = IndexMap::new();
        for (name, property) in self.all_properties(symbol)? {
            let owner = self.reflector.reflect(property.declaring_class())?;
            let context = EvaluationContext::new(&owner.declaration().context)
                .with_class(owner.name())
                .with_lookup(&resolver);
            let Some(value) = property.default_value(self.reflector.evaluator(), &context) else {
                continue;
            };
            let value = value.map_err(|source| ReflectionError::Evaluation {
                class: owner.name().to_string(),
                name: format!("${}", name),
                source,
            })?;
            defaults.insert(name, value);
        }
        Ok(defaults)
    }
}

/// Resolves `Foo::BAR` fetches during evaluation, tracking the constants
/// currently being evaluated so that reference cycles fail instead of
/// recursing forever
struct ConstantResolver<'h, 'r> {
    hierarchy: &'h HierarchyResolver<'r>,
    stack: RefCell<Vec<(FullyQualifiedName, String)>>,
}

impl<'h, 'r> ConstantResolver<'h, 'r> {
    fn new(hierarchy: &'h HierarchyResolver<'r>) -> Self {
        Self {
            hierarchy,
            stack: RefCell::new(Vec::new()),
        }
    }

    fn evaluate(
        &self,
        owner: &SymbolReflection,
        constant: &ConstantReflection,
    ) -> Result<Value, EvaluationError> {
        let evaluator = self.hierarchy.reflector.evaluator();
        let context = EvaluationContext::new(&owner.declaration().context)
            .with_class(owner.name())
            .with_lookup(self);

        if constant.is_evaluated() {
            return constant.value(evaluator, &context);
        }

        let key = (owner.name().clone(), constant.name().to_string());
        if self.stack.borrow().contains(&key) {
            return Err(EvaluationError::CircularReference(format!(
                "{}::{}",
                owner.name(),
                constant.name()
            )));
        }

        self.stack.borrow_mut().push(key);
        let result = constant.value(evaluator, &context);
        self.stack.borrow_mut().pop();
        result
    }
}

impl ConstantLookup for ConstantResolver<'_, '_> {
    fn class_constant(
        &self,
        class: &FullyQualifiedName,
        name: &str,
    ) -> Result<Value, EvaluationError> {
        let reference = format!("{}::{}", class, name);
        let lookup = |err: ReflectionError| {
            if err.is_not_found() {
                EvaluationError::UnknownConstant(reference.clone())
            } else {
                EvaluationError::Unresolvable {
                    constant: reference.clone(),
                    reason: err.to_string(),
                }
            }
        };
        let symbol = self.hierarchy.reflector.reflect(class).map_err(lookup)?;
        let owner = self
            .hierarchy
            .constant_owner(&symbol, name)
            .map_err(lookup)?
            .ok_or_else(|| EvaluationError::UnknownConstant(reference.clone()))?;
        let constant = owner.constant(name).map_err(lookup)?;
        self.evaluate(&owner, constant)
    }

    fn parent_of(&self, class: &FullyQualifiedName) -> Option<FullyQualifiedName> {
        let symbol = self.hierarchy.reflector.reflect(class).ok()?;
        symbol.parent_name().ok().flatten()
    }
}
