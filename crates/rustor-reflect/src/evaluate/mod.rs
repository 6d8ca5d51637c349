//! Static evaluation of constant initializers
//!
//! Class constants and property defaults are stored as source text and only
//! evaluated when somebody asks for their value. Evaluation never runs user
//! code: it understands literals, arrays, operators and references to other
//! constants, and reports anything else as [`EvaluationError::Unsupported`].

pub mod lexer;
pub mod parser;
pub mod value;

pub use parser::{parse_expression, Expr};
pub use value::{ArrayKey, Value};

use crate::declaration::Initializer;
use crate::name::{FullyQualifiedName, NameContext, NameRef, NameResolver};
use parser::{ArrayItem, BinaryOp, UnaryOp};
use std::cmp::Ordering;
use value::{array_insert, format_float};

/// Errors from evaluating a single initializer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("unsupported expression: {0}")]
    Unsupported(String),

    #[error("undefined constant {0}")]
    UnknownConstant(String),

    #[error("circular constant reference: {0}")]
    CircularReference(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("unsupported operand types: {0}")]
    TypeMismatch(String),

    #[error("cannot resolve {constant}: {reason}")]
    Unresolvable { constant: String, reason: String },
}

/// Resolves class constants referenced from an initializer
pub trait ConstantLookup {
    /// Value of `class::name`
    fn class_constant(
        &self,
        class: &FullyQualifiedName,
        name: &str,
    ) -> Result<Value, EvaluationError>;

    /// Parent class of `class`, for `parent::X`
    fn parent_of(&self, class: &FullyQualifiedName) -> Option<FullyQualifiedName>;
}

/// Where an initializer is evaluated
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Class declaring the initializer (`self`)
    pub class: Option<&'a FullyQualifiedName>,
    /// Namespace and imports for resolving class names
    pub names: &'a NameContext,
    pub lookup: Option<&'a dyn ConstantLookup>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(names: &'a NameContext) -> Self {
        Self {
            class: None,
            names,
            lookup: None,
        }
    }

    pub fn with_class(mut self, class: &'a FullyQualifiedName) -> Self {
        self.class = Some(class);
        self
    }

    pub fn with_lookup(mut self, lookup: &'a dyn ConstantLookup) -> Self {
        self.lookup = Some(lookup);
        self
    }
}

/// External evaluator boundary
pub trait ConstantEvaluator: Send + Sync {
    fn evaluate(
        &self,
        initializer: &Initializer,
        context: &EvaluationContext<'_>,
    ) -> Result<Value, EvaluationError>;
}

/// Evaluator for literal and constant expressions
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEvaluator;

impl ConstantEvaluator for DefaultEvaluator {
    fn evaluate(
        &self,
        initializer: &Initializer,
        context: &EvaluationContext<'_>,
    ) -> Result<Value, EvaluationError> {
        let expr = parse_expression(initializer.source())?;
        evaluate_expr(&expr, context)
    }
}

/// Global constants known without any source
fn builtin_constant(name: &str) -> Option<Value> {
    let value = match name {
        "PHP_EOL" => Value::String("\n".to_string()),
        "PHP_INT_MAX" => Value::Int(i64::MAX),
        "PHP_INT_MIN" => Value::Int(i64::MIN),
        "PHP_INT_SIZE" => Value::Int(8),
        "PHP_FLOAT_EPSILON" => Value::Float(f64::EPSILON),
        "PHP_FLOAT_MAX" => Value::Float(f64::MAX),
        "PHP_FLOAT_MIN" => Value::Float(f64::MIN_POSITIVE),
        "PHP_FLOAT_DIG" => Value::Int(15),
        "DIRECTORY_SEPARATOR" => Value::String("/".to_string()),
        "PATH_SEPARATOR" => Value::String(":".to_string()),
        "M_PI" => Value::Float(std::f64::consts::PI),
        "M_E" => Value::Float(std::f64::consts::E),
        "NAN" => Value::Float(f64::NAN),
        "INF" => Value::Float(f64::INFINITY),
        "E_ERROR" => Value::Int(1),
        "E_WARNING" => Value::Int(2),
        "E_PARSE" => Value::Int(4),
        "E_NOTICE" => Value::Int(8),
        "E_USER_ERROR" => Value::Int(256),
        "E_USER_WARNING" => Value::Int(512),
        "E_USER_NOTICE" => Value::Int(1024),
        "E_STRICT" => Value::Int(2048),
        "E_DEPRECATED" => Value::Int(8192),
        "E_USER_DEPRECATED" => Value::Int(16384),
        "E_ALL" => Value::Int(32767),
        "SORT_REGULAR" => Value::Int(0),
        "SORT_NUMERIC" => Value::Int(1),
        "SORT_STRING" => Value::Int(2),
        "JSON_PRETTY_PRINT" => Value::Int(128),
        "JSON_UNESCAPED_SLASHES" => Value::Int(64),
        "JSON_UNESCAPED_UNICODE" => Value::Int(256),
        "JSON_THROW_ON_ERROR" => Value::Int(4194304),
        _ => return None,
    };
    Some(value)
}

fn evaluate_expr(expr: &Expr, ctx: &EvaluationContext<'_>) -> Result<Value, EvaluationError> {
    match expr {
        Expr::Integer(n) => Ok(Value::Int(*n)),
        Expr::Float(f) => Ok(Value::Float(*f)),
        Expr::String(s) => Ok(Value::String(s.clone())),
        Expr::Array(items) => evaluate_array(items, ctx),
        Expr::Constant(name) => evaluate_constant(name, ctx),
        Expr::ClassConstant { class, name } => evaluate_class_constant(class, name, ctx),
        Expr::Unary { op, operand } => {
            let value = evaluate_expr(operand, ctx)?;
            evaluate_unary(*op, value)
        }
        Expr::Binary { op, left, right } => match op {
            BinaryOp::And => {
                let left = evaluate_expr(left, ctx)?;
                if !left.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(evaluate_expr(right, ctx)?.is_truthy()))
            }
            BinaryOp::Or => {
                let left = evaluate_expr(left, ctx)?;
                if left.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(evaluate_expr(right, ctx)?.is_truthy()))
            }
            BinaryOp::Coalesce => {
                let left = evaluate_expr(left, ctx)?;
                if left == Value::Null {
                    evaluate_expr(right, ctx)
                } else {
                    Ok(left)
                }
            }
            _ => {
                let left = evaluate_expr(left, ctx)?;
                let right = evaluate_expr(right, ctx)?;
                evaluate_binary(*op, left, right)
            }
        },
        Expr::Ternary {
            condition,
            then,
            otherwise,
        } => {
            let condition = evaluate_expr(condition, ctx)?;
            if condition.is_truthy() {
                match then {
                    Some(then) => evaluate_expr(then, ctx),
                    None => Ok(condition),
                }
            } else {
                evaluate_expr(otherwise, ctx)
            }
        }
    }
}

fn evaluate_constant(name: &str, ctx: &EvaluationContext<'_>) -> Result<Value, EvaluationError> {
    let bare = name.trim_start_matches('\\');
    match bare.to_ascii_lowercase().as_str() {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        "null" => return Ok(Value::Null),
        "__class__" => {
            return Ok(Value::String(
                ctx.class.map(|c| c.to_string()).unwrap_or_default(),
            ))
        }
        "__namespace__" => return Ok(Value::String(ctx.names.namespace_name())),
        _ => {}
    }

    // Unqualified constants inside a namespace fall back to the global one
    builtin_constant(bare).ok_or_else(|| EvaluationError::UnknownConstant(bare.to_string()))
}

fn evaluate_class_constant(
    class: &str,
    name: &str,
    ctx: &EvaluationContext<'_>,
) -> Result<Value, EvaluationError> {
    let target = match class.to_ascii_lowercase().as_str() {
        "self" | "static" => ctx
            .class
            .cloned()
            .ok_or_else(|| EvaluationError::UnknownConstant(format!("{}::{}", class, name)))?,
        "parent" => {
            let current = ctx
                .class
                .ok_or_else(|| EvaluationError::UnknownConstant(format!("parent::{}", name)))?;
            ctx.lookup
                .and_then(|lookup| lookup.parent_of(current))
                .ok_or_else(|| EvaluationError::UnknownConstant(format!("parent::{}", name)))?
        }
        _ => NameResolver::new()
            .resolve(&NameRef::new(class), ctx.names)
            .ok_or_else(|| EvaluationError::UnknownConstant(format!("{}::{}", class, name)))?,
    };

    if name.eq_ignore_ascii_case("class") {
        return Ok(Value::String(target.to_string()));
    }

    match ctx.lookup {
        Some(lookup) => lookup.class_constant(&target, name),
        None => Err(EvaluationError::UnknownConstant(format!("{}::{}", target, name))),
    }
}

fn evaluate_array(items: &[ArrayItem], ctx: &EvaluationContext<'_>) -> Result<Value, EvaluationError> {
    let mut result = Vec::new();

    for item in items {
        let value = evaluate_expr(&item.value, ctx)?;

        if item.unpack {
            let Value::Array(inner) = value else {
                return Err(EvaluationError::TypeMismatch(format!(
                    "cannot unpack {}",
                    value.type_name()
                )));
            };
            for (key, inner_value) in inner {
                match key {
                    ArrayKey::Int(_) => array_insert(&mut result, None, inner_value),
                    key @ ArrayKey::String(_) => array_insert(&mut result, Some(key), inner_value),
                }
            }
            continue;
        }

        let key = match &item.key {
            Some(key) => Some(to_array_key(evaluate_expr(key, ctx)?)?),
            None => None,
        };
        array_insert(&mut result, key, value);
    }

    Ok(Value::Array(result))
}

fn to_array_key(value: Value) -> Result<ArrayKey, EvaluationError> {
    match value {
        Value::Int(n) => Ok(ArrayKey::Int(n)),
        Value::String(s) => Ok(ArrayKey::from_string(s)),
        Value::Bool(b) => Ok(ArrayKey::Int(b as i64)),
        Value::Null => Ok(ArrayKey::String(String::new())),
        Value::Float(f) => Ok(ArrayKey::Int(f as i64)),
        other => Err(EvaluationError::TypeMismatch(format!(
            "illegal offset type {}",
            other.type_name()
        ))),
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Number::Int(n) => n,
            Number::Float(f) => f as i64,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Number::Int(n) => Value::Int(n),
            Number::Float(f) => Value::Float(f),
        }
    }
}

fn parse_numeric(s: &str) -> Option<Number> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(Number::Int(n));
    }
    let looks_numeric = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if looks_numeric {
        return trimmed.parse::<f64>().ok().map(Number::Float);
    }
    None
}

fn to_number(value: &Value) -> Result<Number, EvaluationError> {
    match value {
        Value::Null => Ok(Number::Int(0)),
        Value::Bool(b) => Ok(Number::Int(*b as i64)),
        Value::Int(n) => Ok(Number::Int(*n)),
        Value::Float(f) => Ok(Number::Float(*f)),
        Value::String(s) => parse_numeric(s).ok_or_else(|| {
            EvaluationError::TypeMismatch(format!("non-numeric string '{}'", s))
        }),
        other => Err(EvaluationError::TypeMismatch(format!(
            "{} used as a number",
            other.type_name()
        ))),
    }
}

fn to_php_string(value: &Value) -> Result<String, EvaluationError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(true) => Ok("1".to_string()),
        Value::Bool(false) => Ok(String::new()),
        Value::Int(n) => Ok(n.to_string()),
        Value::Float(f) => Ok(format_float(*f)),
        Value::String(s) => Ok(s.clone()),
        other => Err(EvaluationError::TypeMismatch(format!(
            "{} to string conversion",
            other.type_name()
        ))),
    }
}

fn evaluate_unary(op: UnaryOp, value: Value) -> Result<Value, EvaluationError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Plus => Ok(to_number(&value)?.into_value()),
        UnaryOp::Negate => Ok(match to_number(&value)? {
            Number::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .unwrap_or(Value::Float(-(n as f64))),
            Number::Float(f) => Value::Float(-f),
        }),
        UnaryOp::BitNot => match value {
            Value::Int(n) => Ok(Value::Int(!n)),
            Value::Float(f) => Ok(Value::Int(!(f as i64))),
            other => Err(EvaluationError::TypeMismatch(format!(
                "~{}",
                other.type_name()
            ))),
        },
    }
}

fn arithmetic(
    left: Number,
    right: Number,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Value {
    match (left, right) {
        (Number::Int(a), Number::Int(b)) => int_op(a, b)
            .map(Value::Int)
            .unwrap_or_else(|| Value::Float(float_op(a as f64, b as f64))),
        (a, b) => Value::Float(float_op(a.as_f64(), b.as_f64())),
    }
}

fn evaluate_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvaluationError> {
    match op {
        BinaryOp::Add => {
            if let (Value::Array(l), Value::Array(r)) = (&left, &right) {
                let mut union = l.clone();
                for (key, value) in r {
                    if !union.iter().any(|(k, _)| k == key) {
                        union.push((key.clone(), value.clone()));
                    }
                }
                return Ok(Value::Array(union));
            }
            Ok(arithmetic(
                to_number(&left)?,
                to_number(&right)?,
                i64::checked_add,
                |a, b| a + b,
            ))
        }
        BinaryOp::Sub => Ok(arithmetic(
            to_number(&left)?,
            to_number(&right)?,
            i64::checked_sub,
            |a, b| a - b,
        )),
        BinaryOp::Mul => Ok(arithmetic(
            to_number(&left)?,
            to_number(&right)?,
            i64::checked_mul,
            |a, b| a * b,
        )),
        BinaryOp::Div => {
            let (l, r) = (to_number(&left)?, to_number(&right)?);
            if r.as_f64() == 0.0 {
                return Err(EvaluationError::DivisionByZero);
            }
            match (l, r) {
                (Number::Int(a), Number::Int(b)) if a.checked_rem(b) == Some(0) => {
                    Ok(a.checked_div(b).map(Value::Int).unwrap_or(Value::Float(a as f64 / b as f64)))
                }
                _ => Ok(Value::Float(l.as_f64() / r.as_f64())),
            }
        }
        BinaryOp::Mod => {
            let (a, b) = (to_number(&left)?.as_i64(), to_number(&right)?.as_i64());
            if b == 0 {
                return Err(EvaluationError::DivisionByZero);
            }
            Ok(Value::Int(a.checked_rem(b).unwrap_or(0)))
        }
        BinaryOp::Pow => {
            let (base, exponent) = (to_number(&left)?, to_number(&right)?);
            if let (Number::Int(b), Number::Int(e)) = (base, exponent) {
                if let Ok(e) = u32::try_from(e) {
                    if let Some(result) = b.checked_pow(e) {
                        return Ok(Value::Int(result));
                    }
                }
            }
            Ok(Value::Float(base.as_f64().powf(exponent.as_f64())))
        }
        BinaryOp::Concat => Ok(Value::String(format!(
            "{}{}",
            to_php_string(&left)?,
            to_php_string(&right)?
        ))),
        BinaryOp::BitAnd => Ok(Value::Int(
            to_number(&left)?.as_i64() & to_number(&right)?.as_i64(),
        )),
        BinaryOp::BitOr => Ok(Value::Int(
            to_number(&left)?.as_i64() | to_number(&right)?.as_i64(),
        )),
        BinaryOp::BitXor => Ok(Value::Int(
            to_number(&left)?.as_i64() ^ to_number(&right)?.as_i64(),
        )),
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight => {
            let value = to_number(&left)?.as_i64();
            let shift = to_number(&right)?.as_i64();
            if shift < 0 {
                return Err(EvaluationError::TypeMismatch(
                    "bit shift by negative number".to_string(),
                ));
            }
            let result = if op == BinaryOp::ShiftLeft {
                if shift >= 64 {
                    0
                } else {
                    value.wrapping_shl(shift as u32)
                }
            } else if shift >= 64 {
                if value < 0 {
                    -1
                } else {
                    0
                }
            } else {
                value >> shift
            };
            Ok(Value::Int(result))
        }
        BinaryOp::Identical => Ok(Value::Bool(left == right)),
        BinaryOp::NotIdentical => Ok(Value::Bool(left != right)),
        BinaryOp::Equal => Ok(Value::Bool(loose_equals(&left, &right))),
        BinaryOp::NotEqual => Ok(Value::Bool(!loose_equals(&left, &right))),
        BinaryOp::Less => Ok(Value::Bool(compare(&left, &right) == Ordering::Less)),
        BinaryOp::LessEqual => Ok(Value::Bool(compare(&left, &right) != Ordering::Greater)),
        BinaryOp::Greater => Ok(Value::Bool(compare(&left, &right) == Ordering::Greater)),
        BinaryOp::GreaterEqual => Ok(Value::Bool(compare(&left, &right) != Ordering::Less)),
        // Short-circuiting happens in evaluate_expr; these only see both sides
        BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        BinaryOp::Coalesce => Ok(if left == Value::Null { right } else { left }),
    }
}

fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len()
                && l.iter().all(|(key, value)| {
                    r.iter()
                        .find(|(k, _)| k == key)
                        .is_some_and(|(_, other)| loose_equals(value, other))
                })
        }
        _ => compare(left, right) == Ordering::Equal,
    }
}

/// PHP 8 loose comparison
fn compare(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Null, Value::String(s)) => "".cmp(s.as_str()),
        (Value::String(s), Value::Null) => s.as_str().cmp(""),
        (Value::Bool(_) | Value::Null, _) | (_, Value::Bool(_) | Value::Null) => {
            left.is_truthy().cmp(&right.is_truthy())
        }
        (Value::String(a), Value::String(b)) => match (parse_numeric(a), parse_numeric(b)) {
            (Some(x), Some(y)) => compare_numbers(x, y),
            _ => a.cmp(b),
        },
        (Value::Int(_) | Value::Float(_), Value::String(s)) => match parse_numeric(s) {
            Some(n) => compare_numbers(number_of(left), n),
            None => to_php_string(left).unwrap_or_default().as_str().cmp(s.as_str()),
        },
        (Value::String(s), Value::Int(_) | Value::Float(_)) => match parse_numeric(s) {
            Some(n) => compare_numbers(n, number_of(right)),
            None => s.as_str().cmp(to_php_string(right).unwrap_or_default().as_str()),
        },
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            compare_numbers(number_of(left), number_of(right))
        }
        (Value::Array(l), Value::Array(r)) => l.len().cmp(&r.len()).then_with(|| {
            for (key, value) in l {
                match r.iter().find(|(k, _)| k == key) {
                    Some((_, other)) => match compare(value, other) {
                        Ordering::Equal => continue,
                        unequal => return unequal,
                    },
                    None => return Ordering::Greater,
                }
            }
            Ordering::Equal
        }),
        (Value::Array(_), _) => Ordering::Greater,
        (_, Value::Array(_)) => Ordering::Less,
        (Value::Object(a), Value::Object(b)) => {
            if a == b {
                Ordering::Equal
            } else {
                a.cmp(b)
            }
        }
        (Value::Object(_), _) => Ordering::Greater,
        (_, Value::Object(_)) => Ordering::Less,
    }
}

fn number_of(value: &Value) -> Number {
    match value {
        Value::Int(n) => Number::Int(*n),
        Value::Float(f) => Number::Float(*f),
        _ => Number::Int(0),
    }
}

fn compare_numbers(a: Number, b: Number) -> Ordering {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x.cmp(&y),
        (x, y) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Less),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn eval(source: &str) -> Result<Value, EvaluationError> {
        let names = NameContext::global();
        DefaultEvaluator.evaluate(&Initializer::new(source), &EvaluationContext::new(&names))
    }

    struct Constants {
        values: HashMap<(String, String), Value>,
    }

    impl ConstantLookup for Constants {
        fn class_constant(
            &self,
            class: &FullyQualifiedName,
            name: &str,
        ) -> Result<Value, EvaluationError> {
            self.values
                .get(&(class.to_string(), name.to_string()))
                .cloned()
                .ok_or_else(|| EvaluationError::UnknownConstant(format!("{}::{}", class, name)))
        }

        fn parent_of(&self, class: &FullyQualifiedName) -> Option<FullyQualifiedName> {
            (class.as_str() == "App\\Child").then(|| FullyQualifiedName::new("App\\Base"))
        }
    }

    #[test]
    fn test_scalars() {
        assert_eq!(eval("42"), Ok(Value::Int(42)));
        assert_eq!(eval("-1.5"), Ok(Value::Float(-1.5)));
        assert_eq!(eval("'abc'"), Ok(Value::String("abc".to_string())));
        assert_eq!(eval("TRUE"), Ok(Value::Bool(true)));
        assert_eq!(eval("null"), Ok(Value::Null));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), Ok(Value::Int(7)));
        assert_eq!(eval("7 / 2"), Ok(Value::Float(3.5)));
        assert_eq!(eval("8 / 2"), Ok(Value::Int(4)));
        assert_eq!(eval("2 ** 10"), Ok(Value::Int(1024)));
        assert_eq!(eval("-2 ** 2"), Ok(Value::Int(-4)));
        assert_eq!(eval("7 % 3"), Ok(Value::Int(1)));
        assert_eq!(eval("1 << 3 | 1"), Ok(Value::Int(9)));
        assert_eq!(eval("PHP_INT_MAX + 1"), Ok(Value::Float(i64::MAX as f64 + 1.0)));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1 / 0"), Err(EvaluationError::DivisionByZero));
        assert_eq!(eval("1 % 0"), Err(EvaluationError::DivisionByZero));
    }

    #[test]
    fn test_concat_and_comparison() {
        assert_eq!(eval("'a' . 1 . true"), Ok(Value::String("a11".to_string())));
        assert_eq!(eval("1 == '1'"), Ok(Value::Bool(true)));
        assert_eq!(eval("1 === '1'"), Ok(Value::Bool(false)));
        assert_eq!(eval("'abc' == 0"), Ok(Value::Bool(false)));
        assert_eq!(eval("null ?? 'x'"), Ok(Value::String("x".to_string())));
        assert_eq!(eval("0 ?: 5"), Ok(Value::Int(5)));
        assert_eq!(eval("1 < 2 && 2 < 3 ? 'y' : 'n'"), Ok(Value::String("y".to_string())));
    }

    #[test]
    fn test_arrays() {
        let value = eval("['a' => 1, 2, '5' => 3, 4]").unwrap();
        let Value::Array(items) = value else {
            panic!("expected array");
        };
        let keys: Vec<_> = items.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(
            keys,
            vec![
                ArrayKey::String("a".to_string()),
                ArrayKey::Int(0),
                ArrayKey::Int(5),
                ArrayKey::Int(6),
            ]
        );
        assert_eq!(eval("[1, ...[2, 3]]").unwrap().to_string(), "[1, 2, 3]");
        assert_eq!(eval("[1] + [5, 6]").unwrap().to_string(), "[1, 6]");
    }

    #[test]
    fn test_class_constants() {
        let mut values = HashMap::new();
        values.insert(("App\\Child".to_string(), "A".to_string()), Value::Int(1));
        values.insert(("App\\Base".to_string(), "B".to_string()), Value::Int(2));
        values.insert(("App\\Other".to_string(), "C".to_string()), Value::Int(3));
        let lookup = Constants { values };

        let names = NameContext::in_namespace("App");
        let class = FullyQualifiedName::new("App\\Child");
        let ctx = EvaluationContext::new(&names)
            .with_class(&class)
            .with_lookup(&lookup);

        let eval = |source: &str| DefaultEvaluator.evaluate(&Initializer::new(source), &ctx);
        assert_eq!(eval("self::A + parent::B + Other::C"), Ok(Value::Int(6)));
        assert_eq!(eval("static::class"), Ok(Value::String("App\\Child".to_string())));
        assert_eq!(eval("Other::class"), Ok(Value::String("App\\Other".to_string())));
        assert_eq!(eval("__CLASS__"), Ok(Value::String("App\\Child".to_string())));
        assert_eq!(eval("__NAMESPACE__"), Ok(Value::String("App".to_string())));
        assert!(matches!(
            eval("self::MISSING"),
            Err(EvaluationError::UnknownConstant(_))
        ));
    }

    #[test]
    fn test_unknown_global_constant() {
        assert_eq!(
            eval("SOME_CONSTANT"),
            Err(EvaluationError::UnknownConstant("SOME_CONSTANT".to_string()))
        );
        assert_eq!(eval("\\PHP_EOL"), Ok(Value::String("\n".to_string())));
    }
}
