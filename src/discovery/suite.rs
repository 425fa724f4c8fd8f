use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use super::{ClassIndex, DescriptorSet};
use crate::diagnostic::Diagnostic;
use crate::error::SuiteError;
use crate::model::ClassRef;
use crate::utils::DocumentFormat;

/// One `<suite>`: a named list of tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tests: Vec<SuiteTest>,
}

/// One `<test>` of a suite: the classes it runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteTest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
}

/// A class entry is either its name or a map with method filters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ClassEntry {
    Name(String),
    Detailed(ClassSelection),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSelection {
    pub name: String,
    #[serde(default)]
    pub included_methods: Vec<String>,
    #[serde(default)]
    pub excluded_methods: Vec<String>,
}

impl ClassEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Detailed(selection) => &selection.name,
        }
    }

    /// Whether the test method `method` of this class runs.
    pub fn selects(&self, method: &str) -> bool {
        match self {
            Self::Name(_) => true,
            Self::Detailed(selection) => {
                let included = selection.included_methods.is_empty()
                    || selection.included_methods.iter().any(|m| m == method);
                included && !selection.excluded_methods.iter().any(|m| m == method)
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SuiteFile {
    Many(Vec<SuiteDocument>),
    One(SuiteDocument),
}

impl From<SuiteFile> for Vec<SuiteDocument> {
    fn from(file: SuiteFile) -> Self {
        match file {
            SuiteFile::Many(suites) => suites,
            SuiteFile::One(suite) => vec![suite],
        }
    }
}

pub fn load_suites(path: &Path) -> Result<Vec<SuiteDocument>, SuiteError> {
    let format = DocumentFormat::from_path(path).map_err(SuiteError::unsupported_format)?;
    let content =
        fs::read_to_string(path).map_err(|e| SuiteError::read_error(path, e.to_string()))?;
    parse_suites(&content, format, path)
}

/// Parses suite documents. YAML may hold several documents separated by
/// `---`; either format may hold a single suite or a list of suites.
pub fn parse_suites(
    content: &str,
    format: DocumentFormat,
    path: &Path,
) -> Result<Vec<SuiteDocument>, SuiteError> {
    let mut suites = Vec::new();
    match format {
        DocumentFormat::Yaml => {
            for document in serde_yaml::Deserializer::from_str(content) {
                let value = serde_yaml::Value::deserialize(document)
                    .map_err(|e| SuiteError::parse_error(path, e.to_string()))?;
                if value.is_null() {
                    continue;
                }
                let file: SuiteFile = serde_yaml::from_value(value)
                    .map_err(|e| SuiteError::parse_error(path, e.to_string()))?;
                suites.extend(Vec::from(file));
            }
        }
        DocumentFormat::Json => {
            let file: SuiteFile = serde_json::from_str(content)
                .map_err(|e| SuiteError::parse_error(path, e.to_string()))?;
            suites.extend(Vec::from(file));
        }
        DocumentFormat::Xml => suites.push(parse_xml_suite(content, path)?),
    }

    if suites.is_empty() {
        return Err(SuiteError::empty(path));
    }
    Ok(suites)
}

/// Reads a TestNG `testng.xml`: `<suite>` holding `<test>` elements whose
/// `<classes>` list `<class name=..>`, optionally narrowed by
/// `<methods><include/><exclude/></methods>`.
fn parse_xml_suite(content: &str, path: &Path) -> Result<SuiteDocument, SuiteError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let document = roxmltree::Document::parse_with_options(content, options)
        .map_err(|e| SuiteError::parse_error(path, e.to_string()))?;

    let root = document.root_element();
    if root.tag_name().name() != "suite" {
        return Err(SuiteError::parse_error(
            path,
            format!("expected <suite>, found <{}>", root.tag_name().name()),
        ));
    }

    let mut suite = SuiteDocument {
        name: root.attribute("name").unwrap_or_default().to_string(),
        tests: Vec::new(),
    };
    for test in elements(root, "test") {
        let name = test.attribute("name").unwrap_or_default().to_string();
        if elements(test, "packages").next().is_some() {
            warn!(test = %name, "<packages> in a suite test are not expanded");
        }
        let classes = elements(test, "classes")
            .flat_map(|classes| elements(classes, "class"))
            .map(|class| xml_class_entry(class, path))
            .collect::<Result<Vec<_>, _>>()?;
        suite.tests.push(SuiteTest { name, classes });
    }
    Ok(suite)
}

fn xml_class_entry(class: roxmltree::Node, path: &Path) -> Result<ClassEntry, SuiteError> {
    let name = class
        .attribute("name")
        .ok_or_else(|| SuiteError::parse_error(path, "<class> without a name attribute"))?
        .to_string();

    let mut selection = ClassSelection {
        name,
        ..ClassSelection::default()
    };
    for methods in elements(class, "methods") {
        for method in methods.children().filter(|n| n.is_element()) {
            let Some(method_name) = method.attribute("name") else {
                continue;
            };
            match method.tag_name().name() {
                "include" => selection.included_methods.push(method_name.to_string()),
                "exclude" => selection.excluded_methods.push(method_name.to_string()),
                _ => {}
            }
        }
    }

    if selection.included_methods.is_empty() && selection.excluded_methods.is_empty() {
        Ok(ClassEntry::Name(selection.name))
    } else {
        Ok(ClassEntry::Detailed(selection))
    }
}

fn elements<'a, 'input: 'a>(
    parent: roxmltree::Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    parent
        .children()
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

/// Collects the census inputs for a suite run.
///
/// A class listed twice in one test runs once; a class listed in two tests
/// runs in each. Providers are those of the root package plus those of any
/// listed class outside it.
pub fn suite_descriptors(
    suites: &[SuiteDocument],
    index: &ClassIndex,
    root_package: &str,
) -> DescriptorSet {
    let mut set = DescriptorSet {
        providers: index.providers_within(root_package),
        diagnostics: index.diagnostics().to_vec(),
        ..DescriptorSet::default()
    };
    let mut provider_classes: HashSet<ClassRef> = index
        .within(root_package)
        .map(|c| c.name.clone())
        .collect();

    for suite in suites {
        for test in &suite.tests {
            let mut seen = HashSet::new();
            for entry in &test.classes {
                let name = ClassRef::new(entry.name().trim());
                if !seen.insert(name.clone()) {
                    debug!(class = %name, test = %test.name, "class listed twice in one test");
                    continue;
                }

                let Some(class) = index.get(&name) else {
                    warn!(class = %name, suite = %suite.name, "suite class not found");
                    set.diagnostics.push(Diagnostic::ClassNotFound {
                        class: name.to_string(),
                        suite: suite.name.clone(),
                    });
                    continue;
                };

                set.tests.extend(
                    class
                        .tests
                        .iter()
                        .filter(|t| entry.selects(&t.descriptor.method_name))
                        .map(|t| t.descriptor.clone()),
                );
                if provider_classes.insert(name) {
                    set.providers
                        .extend(class.providers.iter().map(|p| p.descriptor.clone()));
                }
            }
        }
    }

    debug!(
        suites = suites.len(),
        tests = set.tests.len(),
        providers = set.providers.len(),
        "collected suite descriptors"
    );
    set
}

/// Loads `path` and collects its descriptors. A suite file that cannot be
/// read or parsed yields an empty test list and a diagnostic.
pub fn scan_suite(path: &Path, index: &ClassIndex, root_package: &str) -> DescriptorSet {
    match load_suites(path) {
        Ok(suites) => suite_descriptors(&suites, index, root_package),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "suite not loaded");
            let mut set = suite_descriptors(&[], index, root_package);
            set.diagnostics
                .push(Diagnostic::discovery(Some(path.to_path_buf()), e.to_string()));
            set
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::JavaParser;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn yaml(content: &str) -> Result<Vec<SuiteDocument>, SuiteError> {
        parse_suites(content, DocumentFormat::Yaml, Path::new("testng.yaml"))
    }

    fn index() -> ClassIndex {
        let mut parser = JavaParser::new().unwrap();
        let sources = [
            r#"package counttests;
            public class SearchTest {
                @Test(dataProvider = "queries") public void search(String q) {}
                @Test public void empty() {}
                @Test public void paging() {}
                @DataProvider(name = "queries")
                public Object[][] queries() { return new Object[][] { {"a"}, {"b"} }; }
            }"#,
            r#"package shared;
            public class SharedProviders {
                @DataProvider(name = "ids")
                public static Object[][] ids() { return new Object[][] { {1} }; }
            }"#,
        ];
        ClassIndex::from_files(
            sources
                .iter()
                .map(|s| parser.parse_source(s, Path::new("Test.java")).unwrap()),
        )
    }

    #[test]
    fn test_parses_string_and_map_class_entries() {
        let suites = yaml(
            r#"
name: Regression
tests:
  - name: search
    classes:
      - counttests.SearchTest
      - name: counttests.OtherTest
        includedMethods: [run]
        excludedMethods:
          - skip
"#,
        )
        .unwrap();

        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].name, "Regression");
        assert_eq!(
            suites[0].tests[0].classes,
            vec![
                ClassEntry::Name("counttests.SearchTest".to_string()),
                ClassEntry::Detailed(ClassSelection {
                    name: "counttests.OtherTest".to_string(),
                    included_methods: vec!["run".to_string()],
                    excluded_methods: vec!["skip".to_string()],
                }),
            ]
        );
    }

    #[test]
    fn test_parses_multiple_documents_and_lists() {
        let suites = yaml("name: a\n---\nname: b\n---\n").unwrap();
        let names: Vec<&str> = suites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let suites = yaml("- name: a\n- name: b\n- name: c\n").unwrap();
        assert_eq!(suites.len(), 3);

        let suites = parse_suites(
            r#"{"name": "json", "tests": [{"name": "t", "classes": ["counttests.SearchTest"]}]}"#,
            DocumentFormat::Json,
            Path::new("suite.json"),
        )
        .unwrap();
        assert_eq!(suites[0].tests[0].classes[0].name(), "counttests.SearchTest");
    }

    #[test]
    fn test_rejects_malformed_and_empty_documents() {
        assert!(matches!(
            yaml("tests: [ {classes: "),
            Err(SuiteError::ParseError { .. })
        ));
        assert!(matches!(yaml("tests: 3"), Err(SuiteError::ParseError { .. })));
        assert!(matches!(yaml(""), Err(SuiteError::Empty { .. })));
    }

    #[test]
    fn test_method_filters() {
        let entry = ClassEntry::Detailed(ClassSelection {
            name: "A".to_string(),
            included_methods: vec!["a".to_string(), "b".to_string()],
            excluded_methods: vec!["b".to_string()],
        });
        assert!(entry.selects("a"));
        assert!(!entry.selects("b"));
        assert!(!entry.selects("c"));
        assert!(ClassEntry::Name("A".to_string()).selects("c"));
    }

    #[test]
    fn test_descriptors_for_listed_classes() {
        let suites = yaml(
            r#"
name: Regression
tests:
  - name: first
    classes:
      - counttests.SearchTest
      - counttests.SearchTest
      - counttests.Missing
  - name: second
    classes:
      - name: counttests.SearchTest
        excludedMethods: [paging, empty]
      - shared.SharedProviders
"#,
        )
        .unwrap();

        let set = suite_descriptors(&suites, &index(), "counttests");
        let tests: Vec<String> = set.tests.iter().map(|t| t.qualified_name()).collect();
        assert_eq!(
            tests,
            vec![
                "counttests.SearchTest.search",
                "counttests.SearchTest.empty",
                "counttests.SearchTest.paging",
                "counttests.SearchTest.search",
            ]
        );

        let providers: Vec<String> = set.providers.iter().map(|p| p.qualified_name()).collect();
        assert_eq!(
            providers,
            vec![
                "counttests.SearchTest.queries",
                "shared.SharedProviders.ids",
            ]
        );
        assert_eq!(
            set.diagnostics,
            vec![Diagnostic::ClassNotFound {
                class: "counttests.Missing".to_string(),
                suite: "Regression".to_string(),
            }]
        );
    }

    #[test]
    fn test_unreadable_suite_is_a_diagnostic() {
        let temp_dir = TempDir::new().unwrap();
        let path: PathBuf = temp_dir.path().join("testng.yaml");

        let set = scan_suite(&path, &index(), "counttests");
        assert!(set.tests.is_empty());
        assert_eq!(set.providers.len(), 1);
        assert_eq!(set.diagnostics.len(), 1);

        let toml = temp_dir.path().join("testng.toml");
        std::fs::write(&toml, "name = 'x'").unwrap();
        let set = scan_suite(&toml, &index(), "counttests");
        assert!(set.diagnostics[0].to_string().contains("unsupported suite format: toml"));
    }

    fn xml(content: &str) -> Result<Vec<SuiteDocument>, SuiteError> {
        parse_suites(content, DocumentFormat::Xml, Path::new("testng.xml"))
    }

    #[test]
    fn test_parses_testng_xml() {
        let suites = xml(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE suite SYSTEM "https://testng.org/testng-1.0.dtd">
<suite name="Regression" verbose="1">
  <parameter name="env" value="ci"/>
  <test name="search">
    <classes>
      <class name="counttests.SearchTest"/>
      <class name="counttests.OtherTest">
        <methods>
          <include name="run"/>
          <exclude name="skip"/>
        </methods>
      </class>
    </classes>
  </test>
  <test name="empty"/>
</suite>
"#,
        )
        .unwrap();

        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].name, "Regression");
        assert_eq!(suites[0].tests.len(), 2);
        assert_eq!(
            suites[0].tests[0].classes,
            vec![
                ClassEntry::Name("counttests.SearchTest".to_string()),
                ClassEntry::Detailed(ClassSelection {
                    name: "counttests.OtherTest".to_string(),
                    included_methods: vec!["run".to_string()],
                    excluded_methods: vec!["skip".to_string()],
                }),
            ]
        );
        assert!(suites[0].tests[1].classes.is_empty());
    }

    #[test]
    fn test_rejects_malformed_xml() {
        assert!(matches!(
            xml("<suite name=\"a\"><test>"),
            Err(SuiteError::ParseError { .. })
        ));
        assert!(matches!(
            xml("<tests/>"),
            Err(SuiteError::ParseError { .. })
        ));
        assert!(matches!(
            xml("<suite><test><classes><class/></classes></test></suite>"),
            Err(SuiteError::ParseError { .. })
        ));
    }

    #[test]
    fn test_xml_suite_descriptors() {
        let suites = xml(
            r#"<suite name="Nightly">
  <test name="search">
    <classes>
      <class name="counttests.SearchTest">
        <methods><include name="search"/></methods>
      </class>
      <class name="counttests.Gone"/>
    </classes>
  </test>
</suite>"#,
        )
        .unwrap();

        let set = suite_descriptors(&suites, &index(), "counttests");
        assert_eq!(set.tests.len(), 1);
        assert_eq!(set.tests[0].method_name, "search");
        assert_eq!(
            set.diagnostics,
            vec![Diagnostic::ClassNotFound {
                class: "counttests.Gone".to_string(),
                suite: "Nightly".to_string(),
            }]
        );
    }
}
