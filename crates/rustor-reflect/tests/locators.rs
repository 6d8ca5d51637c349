//! Locator chains over files on disk

use rustor_reflect::{
    BuiltinSourceLocator, DefaultReflector, DirectorySourceLocator, Psr4SourceLocator,
    ReflectionError, Reflector, ReflectorConfig, SourceLocator,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "composer.json",
        r#"{
            "autoload": { "psr-4": { "Shop\\": "src/" } },
            "autoload-dev": { "psr-4": { "Shop\\Tests\\": "tests/" } }
        }"#,
    );
    write(
        temp.path(),
        "src/Catalog/Product.php",
        r#"<?php
namespace Shop\Catalog;

use Shop\Contracts\Priced;

class Product implements Priced, \JsonSerializable
{
    use \Shop\Support\HasSku;

    const CURRENCY = 'EUR';

    public function __construct(protected readonly int $price = 0) {}

    public function price(): int { return $this->price; }

    public function jsonSerialize(): mixed { return []; }
}
"#,
    );
    write(
        temp.path(),
        "src/Contracts/Priced.php",
        "<?php\nnamespace Shop\\Contracts;\n\ninterface Priced extends \\Countable\n{\n    public function price(): int;\n}\n",
    );
    write(
        temp.path(),
        "src/Support/HasSku.php",
        "<?php\nnamespace Shop\\Support;\n\ntrait HasSku\n{\n    private ?string $sku = null;\n\n    public function sku(): ?string { return $this->sku; }\n}\n",
    );
    write(
        temp.path(),
        "tests/ProductTest.php",
        "<?php\nnamespace Shop\\Tests;\n\nclass ProductTest {}\n",
    );
    temp
}

#[test]
fn test_psr4_resolves_across_files() {
    let temp = project();
    let reflector = DefaultReflector::new()
        .with_locator(BuiltinSourceLocator::new())
        .with_locator(
            Psr4SourceLocator::from_composer_file(&temp.path().join("composer.json"), false).unwrap(),
        );

    let product = reflector.reflect_class("Shop\\Catalog\\Product").unwrap();
    assert!(product.file_name().unwrap().ends_with("src/Catalog/Product.php"));
    assert_eq!(product.start_line(), 6);
    assert!(product.implements_interface("Shop\\Contracts\\Priced").unwrap());
    assert!(product.implements_interface("Countable").unwrap());
    assert!(product.implements_interface("JsonSerializable").unwrap());
    assert!(!product.is_iterateable().unwrap());

    assert!(product.has_method("sku"));
    assert_eq!(
        product.method("sku").unwrap().declaring_class().as_str(),
        "Shop\\Support\\HasSku"
    );
    assert!(product.property("price").unwrap().is_readonly());
    assert!(product.has_property("sku"));

    assert!(matches!(
        reflector.reflect_class("Shop\\Tests\\ProductTest"),
        Err(ReflectionError::ClassNotFound(_))
    ));
}

#[test]
fn test_psr4_include_dev() {
    let temp = project();
    let locator = Psr4SourceLocator::from_composer_file(&temp.path().join("composer.json"), true).unwrap();
    assert_eq!(locator.mappings()[0].namespace_prefix, "Shop\\Tests\\");
    assert!(locator.locate(&"Shop\\Tests\\ProductTest".into()).unwrap().is_some());
}

#[test]
fn test_directory_and_builtins_agree() {
    let temp = project();
    let reflector = DefaultReflector::new()
        .with_locator(BuiltinSourceLocator::new())
        .with_locator(DirectorySourceLocator::new(&[temp.path().join("src")]));

    let names: Vec<String> = reflector
        .symbols()
        .unwrap()
        .into_iter()
        .map(|n| n.to_string())
        .filter(|n| n.starts_with("Shop\\"))
        .collect();
    assert_eq!(
        names,
        vec!["Shop\\Catalog\\Product", "Shop\\Contracts\\Priced", "Shop\\Support\\HasSku"]
    );

    let priced = reflector.reflect_class("shop\\contracts\\PRICED").unwrap();
    assert!(priced.is_interface());
    assert!(priced.implements_interface("Countable").unwrap());
}

#[test]
fn test_config_file_end_to_end() {
    let temp = project();
    write(
        temp.path(),
        ".rustor-reflect.toml",
        "[locator]\ncomposer = \"composer.json\"\npaths = [\"tests\"]\n\n[limits]\nmax_depth = 32\n",
    );

    let (config, _) = ReflectorConfig::load_from(temp.path().join("src/Catalog"))
        .unwrap()
        .unwrap();
    let reflector = config.build().unwrap();
    assert_eq!(reflector.max_depth(), 32);

    let product = reflector.reflect_class("Shop\\Catalog\\Product").unwrap();
    assert_eq!(product.constant("CURRENCY").unwrap().as_str(), Some("EUR"));
    assert!(reflector.reflect_class("Shop\\Tests\\ProductTest").is_ok());
}
