//! Java source extraction.
//!
//! Parses test sources with tree-sitter and reads the TestNG annotations
//! the census needs: `@Test` methods become test descriptors, and
//! `@DataProvider` methods become provider descriptors. Nothing is compiled
//! or loaded; only the source text is consulted.

mod annotations;
mod extract;
mod types;

pub use annotations::{annotations_of, concat_strings, keyword_modifiers, Annotation, AnnotationValue};
pub use extract::extract;
pub use types::{classify_return_type, TypeResolver};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use tree_sitter::{Node, Parser, Tree};

use crate::diagnostic::Diagnostic;
use crate::error::{IoError, ParserError, Result};
use crate::model::{ClassRef, ProviderDescriptor, TestDescriptor};

pub const FILE_EXTENSION: &str = "java";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    AbstractClass,
    Interface,
    Enum,
    Record,
}

/// `Class.FIELD` reference left for the class index to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantRef {
    pub class: ClassRef,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JavaTest {
    pub descriptor: TestDescriptor,
    /// Set when `dataProvider` names a constant rather than a literal.
    pub provider_constant: Option<ConstantRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JavaProvider {
    pub descriptor: ProviderDescriptor,
    /// Set when `name` names a constant rather than a literal.
    pub name_constant: Option<ConstantRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JavaClass {
    pub name: ClassRef,
    pub kind: ClassKind,
    pub tests: Vec<JavaTest>,
    pub providers: Vec<JavaProvider>,
    /// `static final String` fields with a literal value.
    pub constants: HashMap<String, String>,
}

impl JavaClass {
    pub fn new(name: ClassRef, kind: ClassKind) -> Self {
        Self {
            name,
            kind,
            tests: Vec::new(),
            providers: Vec::new(),
            constants: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub package: String,
    pub classes: Vec<JavaClass>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct JavaParser {
    parser: Parser,
}

impl JavaParser {
    pub fn new() -> std::result::Result<Self, ParserError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|_| ParserError::language_setup_failed("java"))?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, source: &str) -> Option<Tree> {
        self.parser.parse(source, None)
    }

    pub fn parse_source(
        &mut self,
        source: &str,
        path: &Path,
    ) -> std::result::Result<ParsedFile, ParserError> {
        trace!(path = %path.display(), "parsing java source");
        let tree = self
            .parse(source)
            .ok_or_else(|| ParserError::parse_failed(path))?;

        let mut parsed = extract(&tree, source, path);
        if tree.root_node().has_error() {
            let (line, column) = first_error_position(&tree.root_node());
            parsed.diagnostics.push(Diagnostic::discovery(
                Some(path.to_path_buf()),
                ParserError::syntax_error(path, line, column).to_string(),
            ));
        }
        debug!(
            path = %path.display(),
            classes = parsed.classes.len(),
            "extracted java classes"
        );
        Ok(parsed)
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<ParsedFile> {
        let source = fs::read_to_string(path).map_err(|e| IoError::read_error(path, e))?;
        Ok(self.parse_source(&source, path)?)
    }
}

pub(crate) fn node_text<'s>(node: &Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn first_error_position(node: &Node) -> (usize, usize) {
    if node.is_error() || node.is_missing() {
        let pos = node.start_position();
        return (pos.row + 1, pos.column + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            return first_error_position(&child);
        }
    }
    let pos = node.start_position();
    (pos.row + 1, pos.column + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_setup() {
        let mut parser = JavaParser::new().unwrap();
        let tree = parser.parse("class A {}").unwrap();
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn test_syntax_error_is_reported_not_fatal() {
        let mut parser = JavaParser::new().unwrap();
        let parsed = parser
            .parse_source(
                "package a;\nclass A {\n  @Test public void run() {}\n  void broken( {\n}\n",
                Path::new("A.java"),
            )
            .unwrap();
        assert_eq!(parsed.package, "a");
        assert!(parsed
            .diagnostics
            .iter()
            .any(|d| d.to_string().contains("syntax error in A.java")));
    }
}
