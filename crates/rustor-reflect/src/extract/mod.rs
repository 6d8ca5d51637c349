//! Declaration extraction from PHP source
//!
//! Walks a mago AST and turns every class, interface and trait into a
//! parser-independent [`Declaration`]. Namespace and `use` statements are
//! tracked so that each declaration carries the [`NameContext`] its names
//! must be resolved in. Enums are not part of the reflection model and are
//! skipped.

use crate::declaration::{
    ConstantDecl, Declaration, Initializer, MethodDecl, ParameterDecl, PropertyDecl, SourceLocation,
    SymbolKind, TraitAdaptation, TraitUse, Visibility,
};
use crate::error::ReflectionError;
use crate::name::{NameContext, NameRef};
use bumpalo::Bump;
use mago_database::file::FileId;
use mago_span::{HasSpan, Span};
use mago_syntax::ast::*;
use std::path::{Path, PathBuf};

/// Parse `source` and collect its class-like declarations
pub fn parse_source(source: &str, file: Option<&Path>) -> Result<Vec<Declaration>, ReflectionError> {
    let arena = Bump::new();
    let file_name = file
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "<string>".to_string());
    let file_id = FileId::new(file_name.as_str());
    let (program, parse_error) = mago_syntax::parser::parse_file_content(&arena, file_id, source);

    if let Some(error) = parse_error {
        let line = line_at(source, error.span().start.offset as usize);
        return Err(ReflectionError::Parse {
            file: file.map(Path::to_path_buf).unwrap_or_default(),
            message: format!("line {}: {}", line, error),
        });
    }

    Ok(DeclarationCollector::new(source, file).collect(program))
}

/// Collects declarations from one parsed file
pub struct DeclarationCollector<'s> {
    source: &'s str,
    file: Option<PathBuf>,
    context: NameContext,
    declarations: Vec<Declaration>,
}

/// Flags read from a modifier list
#[derive(Debug, Default, Clone, Copy)]
struct ModifierFlags {
    visibility: Option<Visibility>,
    is_static: bool,
    is_abstract: bool,
    is_final: bool,
    is_readonly: bool,
}

impl ModifierFlags {
    fn read<'m, 'a: 'm>(modifiers: impl Iterator<Item = &'m Modifier<'a>>) -> Self {
        let mut flags = Self::default();
        for modifier in modifiers {
            match modifier {
                Modifier::Public(_) => flags.visibility = Some(Visibility::Public),
                Modifier::Protected(_) => flags.visibility = Some(Visibility::Protected),
                Modifier::Private(_) => flags.visibility = Some(Visibility::Private),
                Modifier::Static(_) => flags.is_static = true,
                Modifier::Abstract(_) => flags.is_abstract = true,
                Modifier::Final(_) => flags.is_final = true,
                Modifier::Readonly(_) => flags.is_readonly = true,
                _ => {}
            }
        }
        flags
    }

    fn visibility(&self) -> Visibility {
        self.visibility.unwrap_or_default()
    }
}

impl<'s> DeclarationCollector<'s> {
    pub fn new(source: &'s str, file: Option<&Path>) -> Self {
        Self {
            source,
            file: file.map(Path::to_path_buf),
            context: NameContext::global(),
            declarations: Vec::new(),
        }
    }

    /// Collect all declarations from a program
    pub fn collect(mut self, program: &Program<'_>) -> Vec<Declaration> {
        for statement in program.statements.iter() {
            self.visit_statement(statement);
        }
        self.declarations
    }

    fn text(&self, span: Span) -> &'s str {
        self.source
            .get(span.start.offset as usize..span.end.offset as usize)
            .unwrap_or("")
    }

    fn visit_statement(&mut self, statement: &Statement<'_>) {
        match statement {
            Statement::Namespace(ns) => {
                let name = namespace_name(self.text(ns.span()));
                self.context = NameContext::in_namespace(name);
                let statements = match &ns.body {
                    NamespaceBody::Implicit(body) => &body.statements,
                    NamespaceBody::BraceDelimited(body) => &body.statements,
                };
                for inner in statements.iter() {
                    self.visit_statement(inner);
                }
                if matches!(ns.body, NamespaceBody::BraceDelimited(_)) {
                    self.context = NameContext::global();
                }
            }
            Statement::Use(use_stmt) => {
                let text = self.text(use_stmt.span());
                add_imports_from_use_text(&mut self.context, text);
            }
            Statement::Block(block) => {
                for inner in block.statements.iter() {
                    self.visit_statement(inner);
                }
            }
            Statement::Class(class) => {
                let flags = ModifierFlags::read(class.modifiers.iter());
                let mut decl = self
                    .start(SymbolKind::Class, class.name.span(), class.span())
                    .with_abstract(flags.is_abstract)
                    .with_final(flags.is_final);
                if let Some(extends) = &class.extends {
                    if let Some(parent) = extends.types.first() {
                        decl = decl.with_parent(self.text(parent.span()));
                    }
                }
                if let Some(implements) = &class.implements {
                    for interface in implements.types.iter() {
                        decl = decl.with_interface(self.text(interface.span()));
                    }
                }
                self.collect_members(class.members.iter(), &mut decl);
                self.declarations.push(decl);
            }
            Statement::Interface(iface) => {
                let mut decl = self.start(SymbolKind::Interface, iface.name.span(), iface.span());
                if let Some(extends) = &iface.extends {
                    for parent in extends.types.iter() {
                        decl = decl.with_interface(self.text(parent.span()));
                    }
                }
                self.collect_members(iface.members.iter(), &mut decl);
                self.declarations.push(decl);
            }
            Statement::Trait(trait_def) => {
                let mut decl = self.start(SymbolKind::Trait, trait_def.name.span(), trait_def.span());
                self.collect_members(trait_def.members.iter(), &mut decl);
                self.declarations.push(decl);
            }
            _ => {}
        }
    }

    fn start(&self, kind: SymbolKind, name: Span, whole: Span) -> Declaration {
        let start = whole.start.offset as usize;
        Declaration::new(kind, self.text(name), self.context.clone()).with_location(SourceLocation {
            file: self.file.clone(),
            start_line: line_at(self.source, start),
            end_line: line_at(self.source, whole.end.offset as usize),
            is_internal: false,
            doc_comment: doc_comment_before(self.source, start),
        })
    }

    fn collect_members<'m, 'a: 'm>(
        &self,
        members: impl Iterator<Item = &'m ClassLikeMember<'a>>,
        decl: &mut Declaration,
    ) {
        for member in members {
            match member {
                ClassLikeMember::Method(method) => {
                    let method_decl = self.method(method);
                    if method_decl.name.eq_ignore_ascii_case("__construct") {
                        self.promoted_properties(method, decl);
                    }
                    decl.methods.push(method_decl);
                }
                ClassLikeMember::Property(Property::Plain(prop)) => {
                    let flags = ModifierFlags::read(prop.modifiers.iter());
                    let type_hint = prop.hint.as_ref().map(|h| self.text(h.span()).to_string());
                    for item in prop.items.iter() {
                        let name = item.variable().name;
                        let default = match item {
                            PropertyItem::Concrete(concrete) => {
                                Some(Initializer::new(self.text(concrete.value.span())))
                            }
                            PropertyItem::Abstract(_) => None,
                        };
                        let mut property = PropertyDecl::new(name)
                            .with_visibility(flags.visibility())
                            .with_static(flags.is_static);
                        property.is_readonly = flags.is_readonly;
                        property.type_hint = type_hint.clone();
                        property.default = default;
                        decl.properties.push(property);
                    }
                }
                ClassLikeMember::Constant(constant) => {
                    let flags = ModifierFlags::read(constant.modifiers.iter());
                    for item in constant.items.iter() {
                        let mut constant_decl =
                            ConstantDecl::new(self.text(item.name.span()), self.text(item.value.span()))
                                .with_visibility(flags.visibility());
                        constant_decl.is_final = flags.is_final;
                        decl.constants.push(constant_decl);
                    }
                }
                ClassLikeMember::TraitUse(trait_use) => {
                    let names: Vec<&str> = trait_use
                        .trait_names
                        .iter()
                        .map(|name| self.text(name.span()))
                        .collect();
                    let mut statement = TraitUse::new(names);
                    statement.adaptations = parse_adaptations(self.text(trait_use.span()));
                    decl.trait_uses.push(statement);
                }
                _ => {}
            }
        }
    }

    fn method(&self, method: &Method<'_>) -> MethodDecl {
        let flags = ModifierFlags::read(method.modifiers.iter());
        let span = method.span();
        let start = span.start.offset as usize;

        let mut decl = MethodDecl::new(self.text(method.name.span()))
            .with_visibility(flags.visibility())
            .with_static(flags.is_static)
            .with_abstract(flags.is_abstract || matches!(method.body, MethodBody::Abstract(_)));
        decl.is_final = flags.is_final;
        decl.start_line = line_at(self.source, start);
        decl.end_line = line_at(self.source, span.end.offset as usize);
        decl.doc_comment = doc_comment_before(self.source, start);

        for param in method.parameter_list.parameters.iter() {
            let mut parameter = ParameterDecl::new(param.variable.name)
                .with_optional(param.default_value.is_some())
                .with_variadic(param.ellipsis.is_some());
            parameter.is_by_reference = param.ampersand.is_some();
            decl.parameters.push(parameter);
        }
        decl
    }

    /// Constructor parameters with a visibility or readonly modifier declare properties
    fn promoted_properties(&self, method: &Method<'_>, decl: &mut Declaration) {
        for param in method.parameter_list.parameters.iter() {
            let flags = ModifierFlags::read(param.modifiers.iter());
            if flags.visibility.is_none() && !flags.is_readonly {
                continue;
            }
            let mut property = PropertyDecl::new(param.variable.name).with_visibility(flags.visibility());
            property.is_readonly = flags.is_readonly;
            property.type_hint = param.hint.as_ref().map(|h| self.text(h.span()).to_string());
            decl.properties.push(property);
        }
    }
}

/// 1-based line of a byte offset
fn line_at(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

/// The `/** ... */` block directly preceding `offset`, if any
fn doc_comment_before(source: &str, offset: usize) -> Option<String> {
    let before = source.get(..offset)?;
    let doc_end = before.rfind("*/")?;
    let doc_start = before[..doc_end].rfind("/*")?;
    if !before[doc_start..].starts_with("/**") {
        return None;
    }

    let between = before[doc_end + 2..].trim();
    if between.is_empty() || between.starts_with("#[") {
        Some(before[doc_start..doc_end + 2].to_string())
    } else {
        None
    }
}

/// Extract the namespace name from `namespace Foo\Bar;` or `namespace Foo\Bar { ... }`
fn namespace_name(text: &str) -> &str {
    let Some(start) = text.find("namespace") else {
        return "";
    };
    let after_keyword = &text[start + "namespace".len()..];
    let end = after_keyword
        .find(|c: char| c == '{' || c == ';')
        .unwrap_or(after_keyword.len());
    after_keyword[..end].trim()
}

/// Register the class imports of a `use` statement. Function and constant
/// imports do not affect class names and are ignored.
fn add_imports_from_use_text(context: &mut NameContext, use_text: &str) {
    let text = use_text.trim();
    let text = match text.get(..3) {
        Some(keyword) if keyword.eq_ignore_ascii_case("use") => &text[3..],
        _ => text,
    };
    let text = text.trim().trim_end_matches(';').trim();
    if is_non_class_import(text) {
        return;
    }

    // Grouped imports: Foo\{Bar, Baz as Qux}
    if let (Some(brace_start), Some(brace_end)) = (text.find('{'), text.rfind('}')) {
        if brace_start < brace_end {
            let prefix = text[..brace_start].trim().trim_end_matches('\\');
            for item in text[brace_start + 1..brace_end].split(',') {
                let item = item.trim();
                if item.is_empty() || is_non_class_import(item) {
                    continue;
                }
                let (name, alias) = split_alias(item);
                let full_name = if prefix.is_empty() {
                    name.to_string()
                } else {
                    format!("{}\\{}", prefix, name)
                };
                context.add_import(&full_name, alias);
            }
            return;
        }
    }

    // Single or comma separated imports: Foo\Bar, Baz as Qux
    for item in text.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (name, alias) = split_alias(item);
        context.add_import(name, alias);
    }
}

fn is_non_class_import(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.starts_with("function ") || lower.starts_with("const ")
}

/// `Foo\Bar as Baz` into (`Foo\Bar`, Some(`Baz`))
fn split_alias(item: &str) -> (&str, Option<&str>) {
    match item.to_ascii_lowercase().find(" as ") {
        Some(pos) => (item[..pos].trim(), Some(item[pos + 4..].trim())),
        None => (item, None),
    }
}

/// Parse the adaptation block of a trait use: `use A, B { A::m as x; ... }`
fn parse_adaptations(text: &str) -> Vec<TraitAdaptation> {
    let (Some(open), Some(close)) = (text.find('{'), text.rfind('}')) else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }
    text[open + 1..close]
        .split(';')
        .filter_map(parse_adaptation)
        .collect()
}

fn parse_adaptation(rule: &str) -> Option<TraitAdaptation> {
    let rule = rule.split_whitespace().collect::<Vec<_>>().join(" ");
    if rule.is_empty() {
        return None;
    }
    let lower = rule.to_ascii_lowercase();

    if let Some(pos) = lower.find(" insteadof ") {
        let (from_trait, method) = split_method_reference(&rule[..pos]);
        let insteadof = rule[pos + " insteadof ".len()..]
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(NameRef::new)
            .collect();
        return Some(TraitAdaptation {
            from_trait,
            method,
            alias: None,
            visibility: None,
            insteadof,
        });
    }

    let pos = lower.find(" as ")?;
    let (from_trait, method) = split_method_reference(&rule[..pos]);
    let mut visibility = None;
    let mut alias = None;
    for word in rule[pos + " as ".len()..].split_whitespace() {
        match Visibility::from_keyword(word) {
            Some(v) => visibility = Some(v),
            None => alias = Some(word.to_string()),
        }
    }
    Some(TraitAdaptation {
        from_trait,
        method,
        alias,
        visibility,
        insteadof: Vec::new(),
    })
}

/// `Trait::method` or bare `method`
fn split_method_reference(text: &str) -> (Option<NameRef>, String) {
    let text = text.trim();
    match text.rsplit_once("::") {
        Some((trait_name, method)) => (Some(NameRef::new(trait_name.trim())), method.trim().to_string()),
        None => (None, text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<Declaration> {
        parse_source(source, Some(Path::new("test.php"))).unwrap()
    }

    #[test]
    fn test_collects_class_like_symbols() {
        let decls = parse(
            r#"<?php
namespace App\Models;

use Illuminate\Database\Eloquent\Model;
use App\Contracts\{HasName, HasId as Identified};

/**
 * A user.
 */
final class User extends Model implements HasName, Identified
{
    use HasTimestamps;
}

interface Shape extends \Countable {}

trait Greets {}

enum Suit {}
"#,
        );
        assert_eq!(decls.len(), 3);

        let user = &decls[0];
        assert_eq!(user.kind, SymbolKind::Class);
        assert_eq!(user.fully_qualified_name().as_str(), "App\\Models\\User");
        assert!(user.modifiers.is_final);
        assert_eq!(user.parent.as_ref().map(|p| p.as_str()), Some("Model"));
        assert_eq!(user.interfaces.len(), 2);
        assert_eq!(
            user.context.import("identified").map(|f| f.as_str()),
            Some("App\\Contracts\\HasId")
        );
        assert_eq!(user.location.start_line, 10);
        assert_eq!(user.location.end_line, 13);
        assert_eq!(user.location.doc_comment.as_deref(), Some("/**\n * A user.\n */"));
        assert_eq!(user.trait_uses[0].trait_names[0].as_str(), "HasTimestamps");

        assert_eq!(decls[1].kind, SymbolKind::Interface);
        assert_eq!(decls[1].interfaces[0].as_str(), "\\Countable");
        assert_eq!(decls[2].kind, SymbolKind::Trait);
        assert!(decls[2].location.doc_comment.is_none());
    }

    #[test]
    fn test_collects_members() {
        let decls = parse(
            r#"<?php
abstract class Account
{
    public const LIMIT = 10, TWICE = self::LIMIT * 2;
    final protected const SECRET = 'x';

    public static int $count = 0;
    protected $name;
    private readonly string $id;

    public function __construct(private int $balance, $plain = null) {}

    abstract protected function close(): void;

    public function &deposit(int $amount, string ...$notes) {}
}
"#,
        );
        let account = &decls[0];
        assert!(account.modifiers.is_abstract);

        let constants: Vec<_> = account.constants.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(constants, vec!["LIMIT", "TWICE", "SECRET"]);
        assert_eq!(account.constants[1].initializer.source(), "self::LIMIT * 2");
        assert!(account.constants[2].is_final);
        assert_eq!(account.constants[2].visibility, Visibility::Protected);

        let count = &account.properties[0];
        assert_eq!(count.name, "count");
        assert!(count.is_static);
        assert_eq!(count.type_hint.as_deref(), Some("int"));
        assert_eq!(count.default.as_ref().map(|d| d.source()), Some("0"));
        assert!(account.properties[2].is_readonly);
        assert_eq!(account.properties[2].visibility, Visibility::Private);

        let balance = &account.properties[3];
        assert_eq!(balance.name, "balance");
        assert_eq!(balance.visibility, Visibility::Private);
        assert_eq!(account.properties.len(), 4);

        let close = &account.methods[1];
        assert!(close.is_abstract);
        assert_eq!(close.visibility, Visibility::Protected);

        let deposit = &account.methods[2];
        assert_eq!(deposit.parameters.len(), 2);
        assert_eq!(deposit.parameters[0].name, "amount");
        assert!(deposit.parameters[1].is_variadic);
        assert!(account.methods[0].parameters[1].is_optional);
    }

    #[test]
    fn test_trait_adaptations() {
        let decls = parse(
            r#"<?php
class Talker {
    use A, B {
        B::smallTalk insteadof A;
        A::bigTalk insteadof B;
        B::bigTalk as protected talk;
        smallTalk as private;
    }
}
"#,
        );
        let statement = &decls[0].trait_uses[0];
        assert_eq!(statement.trait_names.len(), 2);
        assert_eq!(statement.adaptations.len(), 4);

        let insteadof = &statement.adaptations[0];
        assert_eq!(insteadof.from_trait.as_ref().map(|t| t.as_str()), Some("B"));
        assert_eq!(insteadof.insteadof[0].as_str(), "A");

        let alias = &statement.adaptations[2];
        assert_eq!(alias.method, "bigTalk");
        assert_eq!(alias.alias.as_deref(), Some("talk"));
        assert_eq!(alias.visibility, Some(Visibility::Protected));

        let visibility_only = &statement.adaptations[3];
        assert!(visibility_only.from_trait.is_none());
        assert!(visibility_only.alias.is_none());
    }

    #[test]
    fn test_braced_namespaces() {
        let decls = parse(
            r#"<?php
namespace First {
    class A {}
}
namespace {
    class B {}
}
"#,
        );
        assert_eq!(decls[0].fully_qualified_name().as_str(), "First\\A");
        assert_eq!(decls[1].fully_qualified_name().as_str(), "B");
    }

    #[test]
    fn test_function_imports_are_ignored() {
        let mut context = NameContext::global();
        add_imports_from_use_text(&mut context, "use function App\\helper;");
        add_imports_from_use_text(&mut context, "use App\\{Foo, function bar};");
        assert!(context.import("helper").is_none());
        assert!(context.import("bar").is_none());
        assert_eq!(context.import("foo").map(|f| f.as_str()), Some("App\\Foo"));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_source("<?php class {", None).unwrap_err();
        assert!(matches!(err, ReflectionError::Parse { .. }));
    }

    #[test]
    fn test_plain_comment_is_not_a_doc_comment() {
        let source = "<?php\n/** Docs for A */\nclass A {}\n/* plain */\nclass B {}\n";
        let declarations = parse_source(source, None).unwrap();
        assert_eq!(declarations[0].location.doc_comment.as_deref(), Some("/** Docs for A */"));
        assert_eq!(declarations[1].location.doc_comment, None);

        assert_eq!(doc_comment_before("/* a */ /** b */ ", 17).as_deref(), Some("/** b */"));
        assert_eq!(doc_comment_before("/** a */ x /* b */ ", 19), None);
    }

    #[test]
    fn test_line_at() {
        let source = "a\nb\nc";
        assert_eq!(line_at(source, 0), 1);
        assert_eq!(line_at(source, 2), 2);
        assert_eq!(line_at(source, 100), 3);
    }
}
