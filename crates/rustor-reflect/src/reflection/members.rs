//! Method, property and constant reflections

use crate::declaration::{ConstantDecl, Initializer, MethodDecl, ParameterDecl, PropertyDecl, Visibility};
use crate::evaluate::{ConstantEvaluator, EvaluationContext, EvaluationError, Value};
use crate::name::FullyQualifiedName;
use serde::Serialize;
use std::sync::OnceLock;

/// Memoized result of evaluating one initializer.
///
/// Evaluation runs outside the cell and the first stored result wins, so two
/// threads racing on the same initializer both end up with the same value and
/// nested evaluation of another memo never blocks.
#[derive(Debug, Default)]
struct Memo(OnceLock<Result<Value, EvaluationError>>);

impl Memo {
    fn get_or_evaluate(
        &self,
        evaluate: impl FnOnce() -> Result<Value, EvaluationError>,
    ) -> Result<Value, EvaluationError> {
        if let Some(result) = self.0.get() {
            return result.clone();
        }
        let result = evaluate();
        let _ = self.0.set(result.clone());
        self.0.get().cloned().unwrap_or(result)
    }
}

impl Clone for Memo {
    fn clone(&self) -> Self {
        let memo = Memo::default();
        if let Some(result) = self.0.get() {
            let _ = memo.0.set(result.clone());
        }
        memo
    }
}

/// Reflection of a declared method
#[derive(Debug, Clone, Serialize)]
pub struct MethodReflection {
    #[serde(flatten)]
    decl: MethodDecl,
    declaring_class: FullyQualifiedName,
}

impl MethodReflection {
    pub fn new(decl: MethodDecl, declaring_class: FullyQualifiedName) -> Self {
        Self {
            decl,
            declaring_class,
        }
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn declaring_class(&self) -> &FullyQualifiedName {
        &self.declaring_class
    }

    pub fn visibility(&self) -> Visibility {
        self.decl.visibility
    }

    pub fn is_public(&self) -> bool {
        self.decl.visibility == Visibility::Public
    }

    pub fn is_static(&self) -> bool {
        self.decl.is_static
    }

    pub fn is_abstract(&self) -> bool {
        self.decl.is_abstract
    }

    pub fn is_final(&self) -> bool {
        self.decl.is_final
    }

    pub fn is_constructor(&self) -> bool {
        self.decl.name.eq_ignore_ascii_case("__construct")
    }

    pub fn parameters(&self) -> &[ParameterDecl] {
        &self.decl.parameters
    }

    /// Minimum number of arguments a call needs
    pub fn required_parameter_count(&self) -> usize {
        self.decl
            .parameters
            .iter()
            .take_while(|p| !p.is_optional && !p.is_variadic)
            .count()
    }

    pub fn start_line(&self) -> usize {
        self.decl.start_line
    }

    pub fn end_line(&self) -> usize {
        self.decl.end_line
    }

    pub fn doc_comment(&self) -> Option<&str> {
        self.decl.doc_comment.as_deref()
    }
}

/// Reflection of a declared property
#[derive(Debug, Clone, Serialize)]
pub struct PropertyReflection {
    #[serde(flatten)]
    decl: PropertyDecl,
    declaring_class: FullyQualifiedName,
    #[serde(skip)]
    default_value: Memo,
}

impl PropertyReflection {
    pub fn new(decl: PropertyDecl, declaring_class: FullyQualifiedName) -> Self {
        Self {
            decl,
            declaring_class,
            default_value: Memo::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn declaring_class(&self) -> &FullyQualifiedName {
        &self.declaring_class
    }

    pub fn visibility(&self) -> Visibility {
        self.decl.visibility
    }

    pub fn is_public(&self) -> bool {
        self.decl.visibility == Visibility::Public
    }

    pub fn is_static(&self) -> bool {
        self.decl.is_static
    }

    pub fn is_readonly(&self) -> bool {
        self.decl.is_readonly
    }

    pub fn type_hint(&self) -> Option<&str> {
        self.decl.type_hint.as_deref()
    }

    pub fn initializer(&self) -> Option<&Initializer> {
        self.decl.default.as_ref()
    }

    /// Whether the property has a value known at compile time: an explicit
    /// initializer, or the implicit `null` of an untyped property. Typed
    /// properties without initializer start uninitialized.
    pub fn is_default(&self) -> bool {
        self.decl.default.is_some() || self.decl.type_hint.is_none()
    }

    /// Evaluate the compile-time default; `None` for uninitialized typed properties
    pub fn default_value(
        &self,
        evaluator: &dyn ConstantEvaluator,
        context: &EvaluationContext<'_>,
    ) -> Option<Result<Value, EvaluationError>> {
        if !self.is_default() {
            return None;
        }
        Some(self.default_value.get_or_evaluate(|| match &self.decl.default {
            Some(initializer) => evaluator.evaluate(initializer, context),
            None => Ok(Value::Null),
        }))
    }
}

/// Reflection of a class constant
#[derive(Debug, Clone, Serialize)]
pub struct ConstantReflection {
    #[serde(flatten)]
    decl: ConstantDecl,
    declaring_class: FullyQualifiedName,
    #[serde(skip)]
    value: Memo,
}

impl ConstantReflection {
    pub fn new(decl: ConstantDecl, declaring_class: FullyQualifiedName) -> Self {
        Self {
            decl,
            declaring_class,
            value: Memo::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn declaring_class(&self) -> &FullyQualifiedName {
        &self.declaring_class
    }

    pub fn visibility(&self) -> Visibility {
        self.decl.visibility
    }

    pub fn is_final(&self) -> bool {
        self.decl.is_final
    }

    pub fn initializer(&self) -> &Initializer {
        &self.decl.initializer
    }

    /// Whether the value has been evaluated already
    pub fn is_evaluated(&self) -> bool {
        self.value.0.get().is_some()
    }

    /// Evaluate the initializer on first use, then return the memoized result
    pub fn value(
        &self,
        evaluator: &dyn ConstantEvaluator,
        context: &EvaluationContext<'_>,
    ) -> Result<Value, EvaluationError> {
        self.value
            .get_or_evaluate(|| evaluator.evaluate(&self.decl.initializer, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::DefaultEvaluator;
    use crate::name::NameContext;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEvaluator(AtomicUsize);

    impl ConstantEvaluator for CountingEvaluator {
        fn evaluate(
            &self,
            initializer: &Initializer,
            context: &EvaluationContext<'_>,
        ) -> Result<Value, EvaluationError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            DefaultEvaluator.evaluate(initializer, context)
        }
    }

    #[test]
    fn test_constant_is_memoized() {
        let names = NameContext::global();
        let ctx = EvaluationContext::new(&names);
        let evaluator = CountingEvaluator(AtomicUsize::new(0));
        let constant = ConstantReflection::new(
            ConstantDecl::new("LIMIT", "10 * 2"),
            FullyQualifiedName::new("Foo"),
        );

        assert!(!constant.is_evaluated());
        assert_eq!(constant.value(&evaluator, &ctx), Ok(Value::Int(20)));
        assert_eq!(constant.value(&evaluator, &ctx), Ok(Value::Int(20)));
        assert!(constant.is_evaluated());
        assert_eq!(evaluator.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_evaluation_error_is_per_constant() {
        let names = NameContext::global();
        let ctx = EvaluationContext::new(&names);
        let constant = ConstantReflection::new(
            ConstantDecl::new("BAD", "new Foo()"),
            FullyQualifiedName::new("Foo"),
        );
        assert!(matches!(
            constant.value(&DefaultEvaluator, &ctx),
            Err(EvaluationError::Unsupported(_))
        ));
    }

    #[test]
    fn test_property_defaults() {
        let names = NameContext::global();
        let ctx = EvaluationContext::new(&names);
        let owner = FullyQualifiedName::new("Foo");

        let untyped = PropertyReflection::new(PropertyDecl::new("a"), owner.clone());
        assert!(untyped.is_default());
        assert_eq!(
            untyped.default_value(&DefaultEvaluator, &ctx),
            Some(Ok(Value::Null))
        );

        let typed = PropertyReflection::new(PropertyDecl::new("b").with_type("int"), owner.clone());
        assert!(!typed.is_default());
        assert_eq!(typed.default_value(&DefaultEvaluator, &ctx), None);

        let initialized = PropertyReflection::new(
            PropertyDecl::new("c").with_type("array").with_default("['x']"),
            owner,
        );
        assert!(initialized.is_default());
        assert_eq!(
            initialized
                .default_value(&DefaultEvaluator, &ctx)
                .map(|r| r.map(|v| v.to_string())),
            Some(Ok("['x']".to_string()))
        );
    }

    #[test]
    fn test_required_parameter_count() {
        let method = MethodReflection::new(
            MethodDecl::new("run")
                .with_parameter(ParameterDecl::new("$a"))
                .with_parameter(ParameterDecl::new("$b").with_optional(true)),
            FullyQualifiedName::new("Foo"),
        );
        assert_eq!(method.required_parameter_count(), 1);
        assert!(!method.is_constructor());
    }
}
