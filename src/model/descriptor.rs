use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Class named by `dataProviderClass` when the attribute is left at its default.
pub const NO_PROVIDER_CLASS: &str = "java.lang.Object";

/// Identity of a class, compared by fully-qualified name.
///
/// Nested classes use `$` between the outer and inner name, the same form
/// `Class.getName()` produces, so `com.example.Outer$Inner` and
/// `com.example.Outer.Inner` are different classes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ClassRef(String);

impl ClassRef {
    pub fn new(fqn: impl Into<String>) -> Self {
        Self(fqn.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn simple_name(&self) -> &str {
        self.0.rsplit(['.', '$']).next().unwrap_or(&self.0)
    }

    pub fn package(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// True when this class lives in `package` or one of its sub-packages.
    /// An empty package contains every class.
    pub fn is_within(&self, package: &str) -> bool {
        if package.is_empty() {
            return true;
        }
        self.0.len() > package.len()
            && self.0.starts_with(package)
            && self.0.as_bytes()[package.len()] == b'.'
    }

    fn is_no_override(&self) -> bool {
        self.0 == NO_PROVIDER_CLASS
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ClassRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where a method was declared in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSpan {
    pub file: PathBuf,
    pub start_byte: usize,
    pub end_byte: usize,
    pub line: usize,
}

/// One method tagged as a test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestDescriptor {
    pub declaring_class: ClassRef,
    pub method_name: String,
    pub enabled: bool,
    /// Empty means the test has no data provider and is a single case.
    pub provider_name: String,
    /// Class to search for the provider instead of the declaring class.
    pub provider_class: Option<ClassRef>,
}

impl TestDescriptor {
    pub fn new(declaring_class: impl Into<ClassRef>, method_name: impl Into<String>) -> Self {
        Self {
            declaring_class: declaring_class.into(),
            method_name: method_name.into(),
            enabled: true,
            provider_name: String::new(),
            provider_class: None,
        }
    }

    pub fn with_provider(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }

    /// Sets the provider class override. `java.lang.Object` is the
    /// annotation default and means "no override".
    pub fn with_provider_class(mut self, class: impl Into<ClassRef>) -> Self {
        let class = class.into();
        self.provider_class = if class.is_no_override() {
            None
        } else {
            Some(class)
        };
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn has_provider(&self) -> bool {
        !self.provider_name.is_empty()
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_class, self.method_name)
    }
}

/// Shape of the value a data provider returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnShape {
    /// `Object[][]`: one row per case.
    FixedTable,
    /// `Iterator<Object[]>`: one element per case, readable once.
    LazySequence,
}

impl ReturnShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnShape::FixedTable => "fixed_table",
            ReturnShape::LazySequence => "lazy_sequence",
        }
    }
}

impl fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One method tagged as a data provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub declaring_class: ClassRef,
    pub return_shape: ReturnShape,
    pub method_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceSpan>,
}

impl ProviderDescriptor {
    pub fn new(
        name: impl Into<String>,
        declaring_class: impl Into<ClassRef>,
        return_shape: ReturnShape,
    ) -> Self {
        let name = name.into();
        Self {
            method_name: name.clone(),
            name,
            declaring_class: declaring_class.into(),
            return_shape,
            location: None,
        }
    }

    pub fn with_method_name(mut self, method_name: impl Into<String>) -> Self {
        self.method_name = method_name.into();
        self
    }

    pub fn with_location(mut self, location: SourceSpan) -> Self {
        self.location = Some(location);
        self
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_class, self.method_name)
    }
}
