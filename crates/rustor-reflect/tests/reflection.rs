//! Reflection over real PHP sources, parsed through mago

use rustor_reflect::evaluate::ArrayKey;
use rustor_reflect::{
    BuiltinSourceLocator, DefaultReflector, EvaluationError, FullyQualifiedName, ReflectionError,
    Reflector, StringSourceLocator, SymbolKind, Value,
};
use std::collections::HashSet;

fn reflector_for(source: &str) -> DefaultReflector {
    DefaultReflector::new()
        .with_locator(BuiltinSourceLocator::new())
        .with_locator(StringSourceLocator::new(source).unwrap())
}

const SHAPES: &str = r#"<?php
namespace Geometry;

interface Shape
{
    const SIDES = 0;

    public function area(): float;
}

/**
 * Root of every figure.
 */
abstract class Base
{
    protected $label = 'figure';

    abstract public function describe(): string;
}

class Mid extends Base implements Shape
{
    public function area(): float { return 0.0; }

    public function describe(): string { return 'mid'; }
}

class Leaf extends Mid
{
    const SIDES = 4;
}
"#;

#[test]
fn test_name_parts() {
    let reflector = reflector_for(SHAPES);
    for name in ["Geometry\\Leaf", "Geometry\\Shape", "stdClass"] {
        let class = reflector.reflect_class(name).unwrap();
        if class.in_namespace() {
            assert_eq!(
                class.name().as_str(),
                format!("{}\\{}", class.namespace_name(), class.short_name())
            );
        } else {
            assert_eq!(class.name().as_str(), class.short_name());
        }
    }
}

#[test]
fn test_shape_scenario() {
    let reflector = reflector_for(SHAPES);
    let leaf = reflector.reflect_class("Geometry\\Leaf").unwrap();
    let base = reflector.reflect_class("Geometry\\Base").unwrap();

    let names: Vec<String> = leaf
        .interface_names()
        .unwrap()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert!(names.contains(&"Geometry\\Shape".to_string()));
    assert!(leaf.is_subclass_of("Geometry\\Base").unwrap());
    assert!(leaf.is_subclass_of("\\geometry\\MID").unwrap());
    assert!(!leaf.is_subclass_of("Geometry\\Leaf").unwrap());
    assert!(!base.is_instantiable());
    assert!(leaf.is_instantiable());

    assert!(base.parent_class().unwrap().is_none());
    assert_eq!(
        leaf.parent_class().unwrap().unwrap().name().as_str(),
        "Geometry\\Mid"
    );
    let chain: Vec<String> = leaf
        .inheritance_chain()
        .unwrap()
        .iter()
        .map(|c| c.short_name().to_string())
        .collect();
    assert_eq!(chain, vec!["Base", "Mid", "Leaf"]);

    assert_eq!(base.doc_comment(), Some("/**\n * Root of every figure.\n */"));
    assert_eq!(base.start_line(), 14);
}

#[test]
fn test_members_through_hierarchy() {
    let reflector = reflector_for(SHAPES);
    let leaf = reflector.reflect_class("Geometry\\Leaf").unwrap();

    assert!(leaf.has_method("AREA"));
    let describe = leaf.method("describe").unwrap();
    assert_eq!(describe.declaring_class().as_str(), "Geometry\\Mid");
    assert!(!describe.is_abstract());

    assert_eq!(leaf.property("$label").unwrap().declaring_class().as_str(), "Geometry\\Base");
    assert_eq!(
        leaf.default_properties().unwrap()["label"],
        Value::String("figure".to_string())
    );

    // The class's own constant shadows the interface constant
    assert_eq!(leaf.constant("SIDES").unwrap(), Value::Int(4));
    let mid = reflector.reflect_class("Geometry\\Mid").unwrap();
    assert_eq!(mid.constant("SIDES").unwrap(), Value::Int(0));

    assert!(matches!(
        leaf.method("missing"),
        Err(ReflectionError::MethodNotFound { .. })
    ));
    assert!(!leaf.has_property("missing"));
}

#[test]
fn test_interface_transitivity() {
    let reflector = reflector_for(
        r#"<?php
interface Readable extends Traversable {}
class Doc implements Readable {}
"#,
    );
    let doc = reflector.reflect_class("Doc").unwrap();
    assert!(doc.implements_interface("Traversable").unwrap());
    assert!(doc.is_iterateable().unwrap());

    let readable = reflector.reflect_class("Readable").unwrap();
    assert!(!readable.is_instantiable());
    let names: Vec<String> = readable
        .interface_names()
        .unwrap()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(names, vec!["Traversable"]);
}

#[test]
fn test_interface_names_are_unique() {
    let reflector = reflector_for(
        r#"<?php
interface Top {}
interface Left extends Top {}
interface Right extends Top {}
interface Bottom extends Left, Right {}
class Base implements Left {}
class Impl extends Base implements Bottom, Right {}
"#,
    );
    let names = reflector.reflect_class("Impl").unwrap().interface_names().unwrap();
    let unique: HashSet<&FullyQualifiedName> = names.iter().collect();
    assert_eq!(unique.len(), names.len());
    assert_eq!(names.len(), 4);
}

#[test]
fn test_trait_aliases() {
    let reflector = reflector_for(
        r#"<?php
namespace App;

use App\Concerns\Loud as Shouts;

trait Quiet { public function speak() {} }

class Person
{
    use Quiet, Shouts {
        Quiet::speak insteadof Shouts;
        Shouts::speak as shout;
        speak as protected whisper;
    }
}
"#,
    );
    let person = reflector.reflect_class("App\\Person").unwrap();
    let aliases = person.trait_aliases().unwrap();
    assert_eq!(aliases["shout"], "App\\Concerns\\Loud::speak");
    assert_eq!(aliases["whisper"], "App\\Quiet::speak");

    let names: Vec<String> = person.trait_names().unwrap().iter().map(|n| n.to_string()).collect();
    assert_eq!(names, vec!["App\\Quiet", "App\\Concerns\\Loud"]);
    // The imported trait is not declared anywhere
    assert!(matches!(person.traits(), Err(ReflectionError::ClassNotFound(_))));
}

#[test]
fn test_instantiable_by_kind() {
    let reflector = reflector_for(
        r#"<?php
interface I {}
trait T {}
abstract class A {}
final class F {}
class C {}
"#,
    );
    let expected = [("I", false), ("T", false), ("A", false), ("F", true), ("C", true)];
    for (name, instantiable) in expected {
        assert_eq!(
            reflector.reflect_class(name).unwrap().is_instantiable(),
            instantiable,
            "{}",
            name
        );
    }
}

#[test]
fn test_kind_mismatch_errors() {
    let reflector = reflector_for(
        r#"<?php
interface Contract {}
trait Helper {}
class Wrong extends Contract {}
class AlsoWrong implements Helper {}
"#,
    );
    let wrong = reflector.reflect_class("Wrong").unwrap();
    assert!(matches!(
        wrong.parent_class(),
        Err(ReflectionError::NotAClass { kind: SymbolKind::Interface, .. })
    ));
    let also_wrong = reflector.reflect_class("AlsoWrong").unwrap();
    assert!(matches!(
        also_wrong.interface_names(),
        Err(ReflectionError::NotAnInterface { kind: SymbolKind::Trait, .. })
    ));
}

#[test]
fn test_cyclic_inheritance() {
    let reflector = reflector_for(
        r#"<?php
class A extends B {}
class B extends A {}
interface X extends Y {}
interface Y extends X {}
"#,
    );
    match reflector.reflect_class("A").unwrap().inheritance_chain() {
        Err(ReflectionError::CyclicInheritance { chain }) => assert_eq!(chain, vec!["A", "B", "A"]),
        other => panic!("expected a cycle, got {:?}", other.map(|c| c.len())),
    }
    assert!(matches!(
        reflector.reflect_class("X").unwrap().interface_names(),
        Err(ReflectionError::CyclicInheritance { .. })
    ));
}

#[test]
fn test_missing_parent() {
    let reflector = reflector_for("<?php class Orphan extends Unknown {}");
    let orphan = reflector.reflect_class("Orphan").unwrap();
    match orphan.parent_class() {
        Err(ReflectionError::ClassNotFound(name)) => assert_eq!(name, "Unknown"),
        other => panic!("expected ClassNotFound, got {:?}", other.map(|p| p.is_some())),
    }
    assert!(reflector.reflect_class("Nowhere").unwrap_err().is_not_found());
}

#[test]
fn test_constant_evaluation() {
    let reflector = reflector_for(
        r#"<?php
namespace Config;

class Limits
{
    const BASE = 10;
    const DOUBLE = self::BASE * 2;
    const LABEL = 'max-' . self::DOUBLE;
    const ITEMS = [self::BASE, 'key' => Limits::class];
    const LOOP_A = self::LOOP_B;
    const LOOP_B = self::LOOP_A;
    const CALL = strlen('x');
}
"#,
    );
    let limits = reflector.reflect_class("Config\\Limits").unwrap();
    assert_eq!(limits.constant("DOUBLE").unwrap(), Value::Int(20));
    assert_eq!(limits.constant("LABEL").unwrap(), Value::String("max-20".to_string()));

    let list = limits.constant("ITEMS").unwrap();
    assert_eq!(
        list.get(&ArrayKey::String("key".to_string())).and_then(Value::as_str),
        Some("Config\\Limits")
    );

    let values = limits.constants().unwrap();
    assert!(matches!(
        values["LOOP_A"],
        Err(EvaluationError::CircularReference(_))
    ));
    assert!(values["CALL"].is_err());
    assert_eq!(values["BASE"], Ok(Value::Int(10)));
    assert!(matches!(
        limits.constant("LOOP_B"),
        Err(ReflectionError::Evaluation { .. })
    ));
}

#[test]
fn test_is_instance() {
    let reflector = reflector_for(SHAPES);
    let shape = reflector.reflect_class("Geometry\\Shape").unwrap();
    let mid = reflector.reflect_class("Geometry\\Mid").unwrap();

    let leaf = Value::Object("Geometry\\Leaf".into());
    assert!(shape.is_instance(&leaf).unwrap());
    assert!(mid.is_instance(&leaf).unwrap());
    assert!(mid.is_instance(&Value::Object("Geometry\\Mid".into())).unwrap());
    assert!(!mid.is_instance(&Value::Object("stdClass".into())).unwrap());
    assert!(matches!(
        mid.is_instance(&Value::Int(1)),
        Err(ReflectionError::InvalidArgument(_))
    ));
}

#[test]
fn test_cloneable() {
    let reflector = reflector_for(
        r#"<?php
class Plain {}
class Guarded { private function __clone() {} }
class Child extends Guarded {}
abstract class Shapeless {}
"#,
    );
    assert!(reflector.reflect_class("Plain").unwrap().is_cloneable().unwrap());
    assert!(!reflector.reflect_class("Guarded").unwrap().is_cloneable().unwrap());
    assert!(!reflector.reflect_class("Child").unwrap().is_cloneable().unwrap());
    assert!(!reflector.reflect_class("Shapeless").unwrap().is_cloneable().unwrap());
}

#[test]
fn test_concurrent_constant_evaluation() {
    let reflector = std::sync::Arc::new(reflector_for(
        "<?php class Shared { const A = 1 + 2; const B = self::A * 3; }",
    ));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let reflector = std::sync::Arc::clone(&reflector);
            std::thread::spawn(move || reflector.reflect_class("Shared").unwrap().constant("B").unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Value::Int(9));
    }
}
