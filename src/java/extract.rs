use std::path::Path;

use tracing::{trace, warn};
use tree_sitter::{Node, Tree};

use super::annotations::{annotations_of, concat_strings, keyword_modifiers, Annotation, AnnotationValue};
use super::types::{classify_return_type, TypeResolver};
use super::{node_text, ClassKind, ConstantRef, JavaClass, JavaProvider, JavaTest, ParsedFile};
use crate::diagnostic::Diagnostic;
use crate::model::{ClassRef, ProviderDescriptor, SourceSpan, TestDescriptor};

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
];

fn is_type_declaration(node: &Node) -> bool {
    TYPE_DECLARATIONS.contains(&node.kind())
}

/// Reads every class declared in a parsed Java file, together with the
/// tests and data providers it declares.
pub fn extract(tree: &Tree, source: &str, path: &Path) -> ParsedFile {
    let root = tree.root_node();

    let mut package = String::new();
    let mut imports = Vec::new();
    let mut types = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "package_declaration" => package = package_name(&child, source),
            "import_declaration" => {
                if let Some(import) = single_type_import(&child, source) {
                    imports.push(import);
                }
            }
            _ if is_type_declaration(&child) => types.push(child),
            _ => {}
        }
    }

    let mut resolver = TypeResolver::new(package.clone());
    for import in &imports {
        resolver.add_import(import);
    }
    for node in &types {
        register_type(node, source, None, &mut resolver);
    }

    let mut extractor = Extractor {
        source,
        path,
        resolver: &resolver,
        classes: Vec::new(),
        diagnostics: Vec::new(),
    };
    for node in &types {
        extractor.visit_type(node, None);
    }

    ParsedFile {
        path: path.to_path_buf(),
        package,
        classes: extractor.classes,
        diagnostics: extractor.diagnostics,
    }
}

fn package_name(node: &Node, source: &str) -> String {
    let mut cursor = node.walk();
    let name = node
        .named_children(&mut cursor)
        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
        .map(|c| node_text(&c, source).to_string())
        .unwrap_or_default();
    name
}

/// `import a.b.C;` yields `a.b.C`. Wildcard and static imports yield nothing.
fn single_type_import(node: &Node, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    let mut path = None;
    for child in node.children(&mut cursor) {
        match child.kind() {
            "asterisk" | "static" => return None,
            "scoped_identifier" | "identifier" => path = Some(node_text(&child, source).to_string()),
            _ => {}
        }
    }
    path
}

fn body_members<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let Some(body) = node.child_by_field_name("body") else {
        return Vec::new();
    };

    let mut members = Vec::new();
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        if child.kind() == "enum_body_declarations" {
            let mut inner = child.walk();
            members.extend(child.named_children(&mut inner));
        } else {
            members.push(child);
        }
    }
    members
}

fn type_name<'s>(node: &Node, source: &'s str) -> &'s str {
    node.child_by_field_name("name")
        .map(|n| node_text(&n, source))
        .unwrap_or_default()
}

fn class_ref_for(name: &str, outer: Option<&ClassRef>, resolver: &TypeResolver) -> ClassRef {
    match outer {
        Some(outer) => ClassRef::new(format!("{outer}${name}")),
        None => resolver.qualify_top_level(name),
    }
}

/// Makes every class of the file known to the resolver before any
/// annotation is read, so forward references between classes resolve.
fn register_type(
    node: &Node,
    source: &str,
    outer: Option<(&ClassRef, &str)>,
    resolver: &mut TypeResolver,
) {
    let name = type_name(node, source);
    let fqn = class_ref_for(name, outer.map(|(fqn, _)| fqn), resolver);
    let source_name = match outer {
        Some((_, outer_source)) => format!("{outer_source}.{name}"),
        None => name.to_string(),
    };
    resolver.add_local(&source_name, &fqn);

    for member in body_members(node) {
        if is_type_declaration(&member) {
            register_type(&member, source, Some((&fqn, &source_name)), resolver);
        }
    }
}

struct Extractor<'a> {
    source: &'a str,
    path: &'a Path,
    resolver: &'a TypeResolver,
    classes: Vec<JavaClass>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Extractor<'a> {
    fn report(&mut self, message: String) {
        warn!(path = %self.path.display(), "{message}");
        self.diagnostics
            .push(Diagnostic::discovery(Some(self.path.to_path_buf()), message));
    }

    fn visit_type(&mut self, node: &Node, outer: Option<&ClassRef>) {
        let name = type_name(node, self.source);
        let fqn = class_ref_for(name, outer, self.resolver);
        let kind = match node.kind() {
            "interface_declaration" => ClassKind::Interface,
            "enum_declaration" => ClassKind::Enum,
            "record_declaration" => ClassKind::Record,
            _ if keyword_modifiers(node, self.source).iter().any(|m| m == "abstract") => {
                ClassKind::AbstractClass
            }
            _ => ClassKind::Class,
        };
        trace!(class = %fqn, "visiting type");

        let mut class = JavaClass::new(fqn.clone(), kind);
        let mut nested = Vec::new();
        for member in body_members(node) {
            match member.kind() {
                "method_declaration" => self.visit_method(&member, &mut class),
                "field_declaration" | "constant_declaration" => {
                    self.collect_constants(&member, &mut class)
                }
                _ if is_type_declaration(&member) => nested.push(member),
                _ => {}
            }
        }
        self.classes.push(class);

        for member in nested {
            self.visit_type(&member, Some(&fqn));
        }
    }

    fn visit_method(&mut self, node: &Node, class: &mut JavaClass) {
        let method_name = type_name(node, self.source).to_string();
        for annotation in annotations_of(node, self.source) {
            if annotation.is_testng("Test", self.resolver) {
                let test = self.test_from(&annotation, &method_name, &class.name);
                class.tests.push(test);
            } else if annotation.is_testng("DataProvider", self.resolver) {
                if let Some(provider) = self.provider_from(&annotation, node, &method_name, &class.name)
                {
                    class.providers.push(provider);
                }
            }
        }
    }

    fn test_from(&mut self, annotation: &Annotation, method_name: &str, class: &ClassRef) -> JavaTest {
        let mut descriptor = TestDescriptor::new(class.clone(), method_name);
        let qualified = descriptor.qualified_name();
        let mut provider_constant = None;

        match annotation.get("enabled") {
            None => {}
            Some(AnnotationValue::Bool(enabled)) => descriptor.enabled = *enabled,
            Some(other) => self.report(format!(
                "{qualified}: enabled = {} is not a literal; assuming enabled",
                value_text(other)
            )),
        }

        match annotation.get("dataProvider") {
            None => {}
            Some(AnnotationValue::Str(name)) => descriptor.provider_name = name.clone(),
            Some(AnnotationValue::Reference(text)) => {
                descriptor.provider_name = text.clone();
                provider_constant = Some(self.constant_ref(text, class));
            }
            Some(other) => {
                descriptor.provider_name = value_text(other).to_string();
                self.report(format!(
                    "{qualified}: dataProvider = {} cannot be read from source",
                    value_text(other)
                ));
            }
        }

        match annotation.get("dataProviderClass") {
            None => {}
            Some(AnnotationValue::Class(type_text)) => {
                descriptor = descriptor.with_provider_class(self.resolver.resolve(type_text));
            }
            Some(other) => self.report(format!(
                "{qualified}: dataProviderClass = {} is not a class literal",
                value_text(other)
            )),
        }

        JavaTest {
            descriptor,
            provider_constant,
        }
    }

    fn provider_from(
        &mut self,
        annotation: &Annotation,
        node: &Node,
        method_name: &str,
        class: &ClassRef,
    ) -> Option<JavaProvider> {
        let return_type = node
            .child_by_field_name("type")
            .map(|t| node_text(&t, self.source))
            .unwrap_or_default();
        let Some(shape) = classify_return_type(return_type) else {
            self.report(format!(
                "{class}.{method_name}: data provider returns unsupported type {return_type}"
            ));
            return None;
        };

        let mut name_constant = None;
        let name = match annotation.get("name") {
            Some(AnnotationValue::Str(name)) if !name.is_empty() => name.clone(),
            None | Some(AnnotationValue::Str(_)) => method_name.to_string(),
            Some(AnnotationValue::Reference(text)) => {
                name_constant = Some(self.constant_ref(text, class));
                text.clone()
            }
            Some(other) => {
                self.report(format!(
                    "{class}.{method_name}: data provider name = {} cannot be read from source",
                    value_text(other)
                ));
                value_text(other).to_string()
            }
        };

        let span = SourceSpan {
            file: self.path.to_path_buf(),
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            line: node.start_position().row + 1,
        };
        let descriptor = ProviderDescriptor::new(name, class.clone(), shape)
            .with_method_name(method_name)
            .with_location(span);

        Some(JavaProvider {
            descriptor,
            name_constant,
        })
    }

    fn constant_ref(&self, text: &str, current: &ClassRef) -> ConstantRef {
        match text.rsplit_once('.') {
            Some((owner, field)) => ConstantRef {
                class: self.resolver.resolve(owner),
                field: field.to_string(),
            },
            None => ConstantRef {
                class: current.clone(),
                field: text.to_string(),
            },
        }
    }

    fn collect_constants(&mut self, node: &Node, class: &mut JavaClass) {
        let implicit = class.kind == ClassKind::Interface;
        let modifiers = keyword_modifiers(node, self.source);
        let is_constant = modifiers.iter().any(|m| m == "static") && modifiers.iter().any(|m| m == "final");
        if !implicit && !is_constant {
            return;
        }

        let field_type = node
            .child_by_field_name("type")
            .map(|t| node_text(&t, self.source))
            .unwrap_or_default();
        if field_type != "String" && field_type != "java.lang.String" {
            return;
        }

        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            let (Some(name), Some(value)) = (
                declarator.child_by_field_name("name"),
                declarator.child_by_field_name("value"),
            ) else {
                continue;
            };
            if let Some(text) = concat_strings(&value, self.source) {
                class
                    .constants
                    .insert(node_text(&name, self.source).to_string(), text);
            }
        }
    }
}

fn value_text(value: &AnnotationValue) -> &str {
    match value {
        AnnotationValue::Bool(true) => "true",
        AnnotationValue::Bool(false) => "false",
        AnnotationValue::Str(s)
        | AnnotationValue::Class(s)
        | AnnotationValue::Reference(s)
        | AnnotationValue::Other(s) => s,
    }
}
