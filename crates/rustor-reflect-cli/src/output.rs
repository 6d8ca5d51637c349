//! Output formatting for rustor-reflect
//!
//! Supports text (colored terminal) and JSON output formats.

use colored::*;
use indexmap::IndexMap;
use rustor_reflect::{ClassReflection, ReflectionError, SymbolKind, Value};
use serde::Serialize;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodInfo {
    pub name: String,
    pub declaring_class: String,
    pub visibility: String,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyInfo {
    pub name: String,
    pub declaring_class: String,
    pub visibility: String,
    pub is_static: bool,
    pub is_readonly: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConstantInfo {
    pub name: String,
    pub declaring_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Predicates answered for a reflected symbol
#[derive(Debug, Clone, Default, Serialize)]
pub struct Predicates {
    pub is_instantiable: bool,
    pub is_cloneable: Option<bool>,
    pub is_iterateable: Option<bool>,
}

/// Everything reported about one class, interface or trait. Hierarchy
/// queries that fail are recorded in `errors` and leave their section empty.
#[derive(Debug, Clone, Serialize)]
pub struct ClassReport {
    pub name: String,
    pub kind: SymbolKind,
    pub modifiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub is_internal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_comment: Option<String>,
    pub parents: Vec<String>,
    pub interfaces: Vec<String>,
    pub traits: Vec<String>,
    pub trait_aliases: IndexMap<String, String>,
    pub methods: Vec<MethodInfo>,
    pub properties: Vec<PropertyInfo>,
    pub constants: Vec<ConstantInfo>,
    pub predicates: Predicates,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Keep the value of a query, or record why it failed
fn record<T>(errors: &mut Vec<String>, result: Result<T, ReflectionError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            let message = e.to_string();
            if !errors.contains(&message) {
                errors.push(message);
            }
            None
        }
    }
}

impl ClassReport {
    pub fn build(class: &ClassReflection<'_>) -> Self {
        let mut errors = Vec::new();

        let mut modifiers = Vec::new();
        if class.is_abstract() && !class.is_interface() {
            modifiers.push("abstract".to_string());
        }
        if class.is_final() {
            modifiers.push("final".to_string());
        }

        let parents = record(&mut errors, class.inheritance_chain())
            .map(|chain| {
                chain
                    .iter()
                    .rev()
                    .skip(1)
                    .map(|c| c.name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let interfaces = record(&mut errors, class.interface_names())
            .map(|names| names.iter().map(|n| n.to_string()).collect())
            .unwrap_or_default();

        let traits = record(&mut errors, class.trait_names())
            .map(|names| names.iter().map(|n| n.to_string()).collect())
            .unwrap_or_default();

        let trait_aliases = record(&mut errors, class.trait_aliases()).unwrap_or_default();

        let methods = record(&mut errors, class.methods())
            .unwrap_or_default()
            .iter()
            .map(|m| MethodInfo {
                name: m.name().to_string(),
                declaring_class: m.declaring_class().to_string(),
                visibility: m.visibility().to_string(),
                is_static: m.is_static(),
                is_abstract: m.is_abstract(),
                is_final: m.is_final(),
                parameters: m.parameters().iter().map(format_parameter).collect(),
            })
            .collect();

        let defaults = record(&mut errors, class.default_properties()).unwrap_or_default();
        let properties = record(&mut errors, class.properties())
            .unwrap_or_default()
            .iter()
            .map(|p| PropertyInfo {
                name: p.name().to_string(),
                declaring_class: p.declaring_class().to_string(),
                visibility: p.visibility().to_string(),
                is_static: p.is_static(),
                is_readonly: p.is_readonly(),
                type_hint: p.type_hint().map(str::to_string),
                default: defaults.get(p.name()).cloned(),
            })
            .collect();

        let reflections = record(&mut errors, class.constant_reflections()).unwrap_or_default();
        let mut values = record(&mut errors, class.constants()).unwrap_or_default();
        let constants = reflections
            .iter()
            .map(|c| {
                let (value, error) = match values.shift_remove(c.name()) {
                    Some(Ok(value)) => (Some(value), None),
                    Some(Err(e)) => (None, Some(e.to_string())),
                    None => (None, None),
                };
                ConstantInfo {
                    name: c.name().to_string(),
                    declaring_class: c.declaring_class().to_string(),
                    value,
                    error,
                }
            })
            .collect();

        let predicates = Predicates {
            is_instantiable: class.is_instantiable(),
            is_cloneable: record(&mut errors, class.is_cloneable()),
            is_iterateable: record(&mut errors, class.is_iterateable()),
        };

        Self {
            name: class.name().to_string(),
            kind: class.kind(),
            modifiers,
            file: class.file_name().map(|p| p.display().to_string()),
            start_line: class.start_line(),
            end_line: class.end_line(),
            is_internal: class.is_internal(),
            doc_comment: class.doc_comment().map(str::to_string),
            parents,
            interfaces,
            traits,
            trait_aliases,
            methods,
            properties,
            constants,
            predicates,
            errors,
        }
    }
}

fn format_parameter(parameter: &rustor_reflect::declaration::ParameterDecl) -> String {
    let mut out = String::new();
    if parameter.is_by_reference {
        out.push('&');
    }
    if parameter.is_variadic {
        out.push_str("...");
    }
    out.push('$');
    out.push_str(&parameter.name);
    if parameter.is_optional && !parameter.is_variadic {
        out.push('?');
    }
    out
}

/// A symbol listed by `--list`
#[derive(Debug, Clone, Serialize)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub line: usize,
}

/// A requested class that could not be reflected
#[derive(Debug, Clone, Serialize)]
pub struct LookupError {
    pub class: String,
    pub message: String,
}

/// Full JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<ClassReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<SymbolEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<LookupError>,
}

/// Reporter for accumulating and outputting results
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
    classes: Vec<ClassReport>,
    symbols: Vec<SymbolEntry>,
    errors: Vec<LookupError>,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            classes: Vec::new(),
            symbols: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn report_class(&mut self, report: ClassReport) {
        if self.format == OutputFormat::Text {
            print_class(&report, self.verbose);
        }
        self.classes.push(report);
    }

    pub fn report_symbol(&mut self, entry: SymbolEntry) {
        if self.format == OutputFormat::Text {
            let location = match &entry.file {
                Some(file) => format!("{}:{}", file, entry.line),
                None => "internal".to_string(),
            };
            println!(
                "{:<10} {} {}",
                entry.kind.to_string().cyan(),
                entry.name.bold(),
                location.dimmed()
            );
        }
        self.symbols.push(entry);
    }

    pub fn report_error(&mut self, class: &str, error: &ReflectionError) {
        if self.format == OutputFormat::Text {
            eprintln!("{}: {}", "Error".red(), error);
        }
        self.errors.push(LookupError {
            class: class.to_string(),
            message: error.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Print the accumulated JSON document, or the text summary line
    pub fn finish(self) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let output = JsonOutput {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    classes: self.classes,
                    symbols: self.symbols,
                    errors: self.errors,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if !self.symbols.is_empty() {
                    println!();
                    println!("{} symbols", self.symbols.len().to_string().bold());
                }
            }
        }
        Ok(())
    }
}

fn print_class(report: &ClassReport, verbose: bool) {
    let mut header = report.modifiers.join(" ");
    if !header.is_empty() {
        header.push(' ');
    }
    header.push_str(&report.kind.to_string());
    println!("{} {}", header.cyan(), report.name.bold());

    match &report.file {
        Some(file) => println!("  {}: {}:{}-{}", "File".bold(), file, report.start_line, report.end_line),
        None if report.is_internal => println!("  {}: internal", "File".bold()),
        None => println!("  {}: {}-{}", "Lines".bold(), report.start_line, report.end_line),
    }
    if verbose {
        if let Some(doc) = &report.doc_comment {
            println!("  {}:", "Doc".bold());
            for line in doc.lines() {
                println!("    {}", line.trim().dimmed());
            }
        }
    }

    print_list("Parents", &report.parents);
    print_list("Interfaces", &report.interfaces);
    print_list("Traits", &report.traits);
    if !report.trait_aliases.is_empty() {
        println!("  {}:", "Trait aliases".bold());
        for (alias, target) in &report.trait_aliases {
            println!("    {} => {}", alias.green(), target);
        }
    }

    if !report.methods.is_empty() {
        println!("  {}:", "Methods".bold());
        for method in &report.methods {
            let mut flags = vec![method.visibility.clone()];
            if method.is_static {
                flags.push("static".to_string());
            }
            if method.is_abstract {
                flags.push("abstract".to_string());
            }
            if method.is_final {
                flags.push("final".to_string());
            }
            print!(
                "    {} {}({})",
                flags.join(" ").dimmed(),
                method.name.green(),
                method.parameters.join(", ")
            );
            if method.declaring_class != report.name {
                print!(" {}", format!("from {}", method.declaring_class).dimmed());
            }
            println!();
        }
    }

    if !report.properties.is_empty() {
        println!("  {}:", "Properties".bold());
        for property in &report.properties {
            let mut flags = vec![property.visibility.clone()];
            if property.is_static {
                flags.push("static".to_string());
            }
            if property.is_readonly {
                flags.push("readonly".to_string());
            }
            if let Some(type_hint) = &property.type_hint {
                flags.push(type_hint.clone());
            }
            print!("    {} {}", flags.join(" ").dimmed(), format!("${}", property.name).green());
            if let Some(default) = &property.default {
                print!(" = {}", default);
            }
            println!();
        }
    }

    if !report.constants.is_empty() {
        println!("  {}:", "Constants".bold());
        for constant in &report.constants {
            match (&constant.value, &constant.error) {
                (Some(value), _) => println!("    {} = {}", constant.name.green(), value),
                (None, Some(error)) => println!("    {} {}", constant.name.green(), error.red()),
                (None, None) => println!("    {}", constant.name.green()),
            }
        }
    }

    let predicates = &report.predicates;
    println!(
        "  {}: instantiable={} cloneable={} iterateable={}",
        "Predicates".bold(),
        predicates.is_instantiable,
        format_flag(predicates.is_cloneable),
        format_flag(predicates.is_iterateable)
    );

    for error in &report.errors {
        println!("  {}: {}", "Error".red(), error);
    }
    println!();
}

fn print_list(title: &str, items: &[String]) {
    if !items.is_empty() {
        println!("  {}: {}", title.bold(), items.join(", "));
    }
}

fn format_flag(flag: Option<bool>) -> String {
    match flag {
        Some(value) => value.to_string(),
        None => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustor_reflect::{BuiltinSourceLocator, DefaultReflector, Reflector, StringSourceLocator};

    const SOURCE: &str = r#"<?php
namespace App;

interface HasName {}

trait Greets {
    public function greet() {}
}

abstract class Base implements HasName {
    const PREFIX = 'base';
    protected $name = 'anonymous';
}

final class User extends Base implements \Countable {
    use Greets { greet as protected hello; }

    const LABEL = self::PREFIX . ':user';
    const BROKEN = self::MISSING;

    public function count(): int { return 1; }
}
"#;

    fn reflector() -> DefaultReflector {
        DefaultReflector::new()
            .with_locator(BuiltinSourceLocator::new())
            .with_locator(StringSourceLocator::new(SOURCE).unwrap())
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }

    #[test]
    fn test_class_report() {
        let reflector = reflector();
        let user = reflector.reflect_class("App\\User").unwrap();
        let report = ClassReport::build(&user);

        assert_eq!(report.name, "App\\User");
        assert_eq!(report.modifiers, vec!["final"]);
        assert_eq!(report.parents, vec!["App\\Base"]);
        assert!(report.interfaces.contains(&"Countable".to_string()));
        assert!(report.interfaces.contains(&"App\\HasName".to_string()));
        assert_eq!(report.traits, vec!["App\\Greets"]);
        assert_eq!(report.trait_aliases["hello"], "App\\Greets::greet");

        let name = report.properties.iter().find(|p| p.name == "name").unwrap();
        assert_eq!(name.declaring_class, "App\\Base");
        assert_eq!(name.default, Some(Value::String("anonymous".to_string())));

        let label = report.constants.iter().find(|c| c.name == "LABEL").unwrap();
        assert_eq!(label.value, Some(Value::String("base:user".to_string())));
        let broken = report.constants.iter().find(|c| c.name == "BROKEN").unwrap();
        assert!(broken.value.is_none());
        assert!(broken.error.is_some());

        assert!(report.predicates.is_instantiable);
        assert_eq!(report.predicates.is_iterateable, Some(false));
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_class_report_json() {
        let reflector = reflector();
        let base = reflector.reflect_class("App\\Base").unwrap();
        let json = serde_json::to_value(ClassReport::build(&base)).unwrap();
        assert_eq!(json["kind"], "class");
        assert_eq!(json["modifiers"][0], "abstract");
        assert_eq!(json["predicates"]["is_instantiable"], false);
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_format_parameter() {
        use rustor_reflect::declaration::ParameterDecl;
        assert_eq!(format_parameter(&ParameterDecl::new("id")), "$id");
        assert_eq!(format_parameter(&ParameterDecl::new("$limit").with_optional(true)), "$limit?");
        assert_eq!(format_parameter(&ParameterDecl::new("args").with_variadic(true)), "...$args");
    }
}
