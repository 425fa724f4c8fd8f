//! Evaluates data providers straight from their Java source.
//!
//! A provider is located through the span recorded at extraction time,
//! checked for the access and construction rules a reflective call would
//! enforce, and its body is reduced to rows by [`eval`].

mod eval;
mod file_cache;

pub use eval::{evaluate_method, EvalFailure, Rows};
pub use file_cache::{CachedFile, FileCache};

use std::cell::RefCell;

use tracing::{debug, trace};
use tree_sitter::Node;

use super::{ProviderInvoker, ProviderOutput};
use crate::error::{InvocationError, ParserError};
use crate::java::{keyword_modifiers, node_text, JavaParser};
use crate::model::ProviderDescriptor;

pub struct SourceInvoker {
    cache: RefCell<FileCache>,
    parser: RefCell<JavaParser>,
}

impl SourceInvoker {
    pub fn new() -> Result<Self, ParserError> {
        Ok(Self {
            cache: RefCell::new(FileCache::new()),
            parser: RefCell::new(JavaParser::new()?),
        })
    }

    pub fn cached_files(&self) -> usize {
        self.cache.borrow().file_count()
    }
}

impl ProviderInvoker for SourceInvoker {
    fn invoke(&self, provider: &ProviderDescriptor) -> Result<ProviderOutput, InvocationError> {
        let name = provider.qualified_name();
        let span = provider
            .location
            .as_ref()
            .ok_or_else(|| InvocationError::source_unavailable(&name, "no source location"))?;

        let mut cache = self.cache.borrow_mut();
        let mut parser = self.parser.borrow_mut();
        let file = cache
            .get_or_load(&span.file, &mut parser)
            .map_err(|e| InvocationError::source_unavailable(&name, e.to_string()))?;

        let root = file.tree.root_node();
        let method = root
            .descendant_for_byte_range(span.start_byte, span.end_byte)
            .and_then(|node| enclosing_method(node, span.start_byte, span.end_byte))
            .ok_or_else(|| {
                InvocationError::source_unavailable(
                    &name,
                    format!("no method at {}:{}", span.file.display(), span.line),
                )
            })?;
        trace!(provider = %name, line = span.line, "located provider method");

        // An instance of the declaring class is made first, static or not.
        check_constructible(&method, &file.source)?;
        if keyword_modifiers(&method, &file.source)
            .iter()
            .any(|m| m == "private")
        {
            return Err(InvocationError::access(&name, "method is private"));
        }

        let rows = evaluate_method(&method, &file.source).map_err(|failure| match failure {
            EvalFailure::Threw(exception) => InvocationError::provider_threw(&name, exception),
            EvalFailure::Unsupported(reason) => InvocationError::not_evaluable(&name, reason),
        })?;
        debug!(provider = %name, rows = rows.len(), "evaluated provider source");

        Ok(rows.into_output(provider.return_shape))
    }
}

fn enclosing_method(node: Node<'_>, start: usize, end: usize) -> Option<Node<'_>> {
    let mut current = Some(node);
    while let Some(node) = current {
        if node.kind() == "method_declaration"
            && node.start_byte() == start
            && node.end_byte() == end
        {
            return Some(node);
        }
        current = node.parent();
    }
    None
}

/// The declaration of the type whose body holds `member`.
fn declaring_type<'t>(member: &Node<'t>) -> Option<Node<'t>> {
    let mut current = member.parent();
    while let Some(node) = current {
        if matches!(
            node.kind(),
            "class_declaration"
                | "interface_declaration"
                | "enum_declaration"
                | "record_declaration"
                | "object_creation_expression"
        ) {
            return Some(node);
        }
        current = node.parent();
    }
    None
}

/// Every provider is called on a fresh instance of its class, made through
/// an accessible no-argument constructor.
fn check_constructible(method: &Node, source: &str) -> Result<(), InvocationError> {
    let declaration = declaring_type(method)
        .ok_or_else(|| InvocationError::construction("<unknown>", "no enclosing type"))?;
    let class = declaration
        .child_by_field_name("name")
        .map(|n| node_text(&n, source))
        .unwrap_or("<anonymous>");
    let modifiers = keyword_modifiers(&declaration, source);

    match declaration.kind() {
        "interface_declaration" => {
            return Err(InvocationError::construction(class, "type is an interface"))
        }
        "enum_declaration" => {
            return Err(InvocationError::construction(class, "type is an enum"))
        }
        "object_creation_expression" => {
            return Err(InvocationError::construction(class, "type is anonymous"))
        }
        _ => {}
    }
    if modifiers.iter().any(|m| m == "abstract") {
        return Err(InvocationError::construction(class, "type is abstract"));
    }
    let enclosing = declaring_type(&declaration);
    let implicitly_static = declaration.kind() == "record_declaration"
        || enclosing.is_some_and(|outer| outer.kind() == "interface_declaration");
    if enclosing.is_some() && !implicitly_static && !modifiers.iter().any(|m| m == "static") {
        return Err(InvocationError::construction(
            class,
            "inner class needs an enclosing instance",
        ));
    }
    if declaration.kind() == "record_declaration" {
        let components = declaration
            .child_by_field_name("parameters")
            .map(|p| p.named_child_count())
            .unwrap_or(0);
        if components > 0 {
            return Err(InvocationError::construction(
                class,
                "record has no no-arg constructor",
            ));
        }
        return Ok(());
    }

    let Some(body) = declaration.child_by_field_name("body") else {
        return Ok(());
    };
    let mut cursor = body.walk();
    let constructors: Vec<Node> = body
        .named_children(&mut cursor)
        .filter(|member| member.kind() == "constructor_declaration")
        .collect();
    if constructors.is_empty() {
        return Ok(());
    }

    let no_arg = constructors.iter().find(|ctor| {
        ctor.child_by_field_name("parameters")
            .is_some_and(|p| p.named_child_count() == 0)
    });
    match no_arg {
        None => Err(InvocationError::construction(class, "no no-arg constructor")),
        Some(ctor) if keyword_modifiers(ctor, source).iter().any(|m| m == "private") => Err(
            InvocationError::construction(class, "no-arg constructor is private"),
        ),
        Some(ctor) => match ctor
            .child_by_field_name("body")
            .and_then(|b| b.named_child(0))
            .filter(|first| first.kind() == "throw_statement")
        {
            Some(_) => Err(InvocationError::construction(class, "constructor throws")),
            None => Ok(()),
        },
    }
}
