use std::collections::HashMap;

use crate::model::{ClassRef, ReturnShape, NO_PROVIDER_CLASS};

/// Resolves type names written in a Java file to fully-qualified classes.
///
/// Lookup order: classes declared in the same file, single-type imports,
/// `java.lang.Object`, dotted names taken as already qualified, and finally
/// the file's own package. Wildcard imports cannot be resolved without the
/// whole classpath, so a simple name only reachable through one falls back
/// to the file's package.
#[derive(Debug, Clone, Default)]
pub struct TypeResolver {
    package: String,
    imports: HashMap<String, String>,
    local: HashMap<String, String>,
}

impl TypeResolver {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Self::default()
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn add_import(&mut self, path: &str) {
        let path = path.trim();
        if let Some((_, simple)) = path.rsplit_once('.') {
            self.imports.insert(simple.to_string(), path.to_string());
        }
    }

    pub fn imported(&self, simple: &str) -> Option<&str> {
        self.imports.get(simple).map(String::as_str)
    }

    /// Registers a class declared in this file under both its simple name
    /// and its dotted source form (`Outer.Inner`).
    pub fn add_local(&mut self, source_name: &str, fqn: &ClassRef) {
        self.local
            .insert(source_name.to_string(), fqn.name().to_string());
        let simple = fqn.simple_name().to_string();
        self.local
            .entry(simple)
            .or_insert_with(|| fqn.name().to_string());
    }

    pub fn qualify_top_level(&self, simple: &str) -> ClassRef {
        if self.package.is_empty() {
            ClassRef::new(simple)
        } else {
            ClassRef::new(format!("{}.{simple}", self.package))
        }
    }

    pub fn resolve(&self, type_text: &str) -> ClassRef {
        let name = strip_generics(type_text);

        if let Some(fqn) = self.local.get(name.as_str()) {
            return ClassRef::new(fqn.clone());
        }
        if let Some(fqn) = self.imports.get(name.as_str()) {
            return ClassRef::new(fqn.clone());
        }
        if name == "Object" {
            return ClassRef::new(NO_PROVIDER_CLASS);
        }

        if let Some((head, rest)) = name.split_once('.') {
            // `Outer.Inner` where `Outer` is known: nested class of a known type.
            let outer = self.local.get(head).or_else(|| self.imports.get(head));
            if let Some(outer) = outer {
                return ClassRef::new(format!("{outer}${}", rest.replace('.', "$")));
            }
            return ClassRef::new(name);
        }

        self.qualify_top_level(&name)
    }
}

fn strip_generics(type_text: &str) -> String {
    let compact: String = type_text.chars().filter(|c| !c.is_whitespace()).collect();
    match compact.find('<') {
        Some(idx) => compact[..idx].to_string(),
        None => compact,
    }
}

/// Decides a provider's shape from its declared return type.
///
/// Two-dimensional arrays are fixed tables; `Iterator` (bare, generic or
/// qualified) is a lazy sequence. Anything else is not a supported
/// provider type.
pub fn classify_return_type(type_text: &str) -> Option<ReturnShape> {
    let compact: String = type_text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.ends_with("[][]") && !compact.ends_with("[][][]") {
        return Some(ReturnShape::FixedTable);
    }

    let base = strip_generics(&compact);
    let simple = base.rsplit('.').next().unwrap_or(&base);
    if simple == "Iterator" && !compact.ends_with(']') {
        return Some(ReturnShape::LazySequence);
    }
    None
}
