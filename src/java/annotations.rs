use std::collections::HashMap;

use tree_sitter::Node;

use super::node_text;
use super::types::TypeResolver;
use crate::utils::{extract_last_segment, unquote_string};

const TESTNG_ANNOTATIONS: &str = "org.testng.annotations";

/// A single annotation element value, as far as it can be read from source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    Bool(bool),
    Str(String),
    /// `Foo.class`, holding the type text (`Foo`).
    Class(String),
    /// A constant reference such as `NAME` or `Providers.NAME`.
    Reference(String),
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Name as written (`Test`, `org.testng.annotations.Test`).
    pub name: String,
    pub values: HashMap<String, AnnotationValue>,
}

impl Annotation {
    pub fn simple_name(&self) -> String {
        extract_last_segment(&self.name)
    }

    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.values.get(key)
    }

    /// Whether this is the TestNG annotation `simple`.
    ///
    /// A fully-qualified name must be the TestNG one. A simple name counts
    /// unless an explicit import binds it to some other package, so that a
    /// JUnit `@Test` is not mistaken for a TestNG test.
    pub fn is_testng(&self, simple: &str, resolver: &TypeResolver) -> bool {
        if self.name.contains('.') {
            return self.name == format!("{TESTNG_ANNOTATIONS}.{simple}");
        }
        if self.name != simple {
            return false;
        }
        match resolver.imported(simple) {
            Some(path) => path == format!("{TESTNG_ANNOTATIONS}.{simple}"),
            None => true,
        }
    }
}

/// Annotations attached to a declaration through its `modifiers` node.
pub fn annotations_of(declaration: &Node, source: &str) -> Vec<Annotation> {
    let Some(modifiers) = modifiers_of(declaration) else {
        return Vec::new();
    };

    let mut annotations = Vec::new();
    let mut cursor = modifiers.walk();
    for child in modifiers.children(&mut cursor) {
        match child.kind() {
            "marker_annotation" | "annotation" => {
                if let Some(annotation) = parse_annotation(&child, source) {
                    annotations.push(annotation);
                }
            }
            _ => {}
        }
    }
    annotations
}

/// Keyword modifiers (`public`, `static`, ...) of a declaration.
pub fn keyword_modifiers(declaration: &Node, source: &str) -> Vec<String> {
    let Some(modifiers) = modifiers_of(declaration) else {
        return Vec::new();
    };

    let mut keywords = Vec::new();
    let mut cursor = modifiers.walk();
    for child in modifiers.children(&mut cursor) {
        if !matches!(child.kind(), "marker_annotation" | "annotation" | "line_comment" | "block_comment") {
            keywords.push(node_text(&child, source).to_string());
        }
    }
    keywords
}

fn modifiers_of<'t>(declaration: &Node<'t>) -> Option<Node<'t>> {
    let mut cursor = declaration.walk();
    let found = declaration
        .children(&mut cursor)
        .find(|child| child.kind() == "modifiers");
    found
}

fn parse_annotation(node: &Node, source: &str) -> Option<Annotation> {
    let name = node.child_by_field_name("name")?;
    let mut values = HashMap::new();

    if let Some(arguments) = node.child_by_field_name("arguments") {
        let mut cursor = arguments.walk();
        for child in arguments.named_children(&mut cursor) {
            if child.kind() == "element_value_pair" {
                let (Some(key), Some(value)) = (
                    child.child_by_field_name("key"),
                    child.child_by_field_name("value"),
                ) else {
                    continue;
                };
                values.insert(
                    node_text(&key, source).to_string(),
                    parse_value(&value, source),
                );
            } else if !child.kind().ends_with("comment") {
                values.insert("value".to_string(), parse_value(&child, source));
            }
        }
    }

    Some(Annotation {
        name: node_text(&name, source).to_string(),
        values,
    })
}

fn parse_value(node: &Node, source: &str) -> AnnotationValue {
    match node.kind() {
        "true" => AnnotationValue::Bool(true),
        "false" => AnnotationValue::Bool(false),
        "string_literal" => AnnotationValue::Str(unquote_string(node_text(node, source))),
        "class_literal" => {
            let type_text = node
                .named_child(0)
                .map(|t| node_text(&t, source))
                .unwrap_or_default();
            AnnotationValue::Class(type_text.to_string())
        }
        "identifier" | "field_access" => {
            AnnotationValue::Reference(node_text(node, source).to_string())
        }
        "parenthesized_expression" => match node.named_child(0) {
            Some(inner) => parse_value(&inner, source),
            None => AnnotationValue::Other(node_text(node, source).to_string()),
        },
        "binary_expression" => match concat_strings(node, source) {
            Some(joined) => AnnotationValue::Str(joined),
            None => AnnotationValue::Other(node_text(node, source).to_string()),
        },
        _ => AnnotationValue::Other(node_text(node, source).to_string()),
    }
}

/// Folds `"a" + "b"` into `"ab"` when every operand is a string literal.
pub fn concat_strings(node: &Node, source: &str) -> Option<String> {
    match node.kind() {
        "string_literal" => Some(unquote_string(node_text(node, source))),
        "parenthesized_expression" => concat_strings(&node.named_child(0)?, source),
        "binary_expression" => {
            let operator = node.child_by_field_name("operator")?;
            if node_text(&operator, source) != "+" {
                return None;
            }
            let left = concat_strings(&node.child_by_field_name("left")?, source)?;
            let right = concat_strings(&node.child_by_field_name("right")?, source)?;
            Some(left + &right)
        }
        _ => None,
    }
}
