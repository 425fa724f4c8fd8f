use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, warn};

use super::walk::walk_source_files;
use crate::diagnostic::Diagnostic;
use crate::java::{ConstantRef, JavaClass, JavaParser, ParsedFile, FILE_EXTENSION};
use crate::model::{ClassRef, ProviderDescriptor, TestDescriptor};

/// Every class declared under the source roots, by fully-qualified name.
///
/// Classes keep the order in which their files were discovered, which is
/// the order providers are offered to the resolver.
#[derive(Debug, Default)]
pub struct ClassIndex {
    classes: Vec<JavaClass>,
    by_name: HashMap<ClassRef, usize>,
    diagnostics: Vec<Diagnostic>,
}

impl ClassIndex {
    /// Walks and parses every Java file under `roots`. Problems with single
    /// files or roots are recorded as diagnostics and the walk continues.
    pub fn build(roots: &[PathBuf], excluded_dirs: &[String]) -> Self {
        let mut index = Self::default();
        let mut parser = match JavaParser::new() {
            Ok(parser) => parser,
            Err(e) => {
                index.diagnostics.push(Diagnostic::discovery(None, e.to_string()));
                return index;
            }
        };

        let mut parsed = Vec::new();
        for root in roots {
            let files = match walk_source_files(root, FILE_EXTENSION, excluded_dirs, true) {
                Ok(files) => files,
                Err(e) => {
                    warn!(root = %root.display(), error = %e, "skipping source root");
                    index
                        .diagnostics
                        .push(Diagnostic::discovery(Some(root.clone()), e.to_string()));
                    continue;
                }
            };
            debug!(root = %root.display(), files = files.len(), "walking source root");

            for path in files {
                match parser.parse_file(&path) {
                    Ok(file) => parsed.push(file),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable file");
                        index
                            .diagnostics
                            .push(Diagnostic::discovery(Some(path), e.to_string()));
                    }
                }
            }
        }

        index.extend(parsed);
        index
    }

    pub fn from_files(files: impl IntoIterator<Item = ParsedFile>) -> Self {
        let mut index = Self::default();
        index.extend(files);
        index
    }

    fn extend(&mut self, files: impl IntoIterator<Item = ParsedFile>) {
        for file in files {
            self.diagnostics.extend(file.diagnostics);
            for class in file.classes {
                if self.by_name.contains_key(&class.name) {
                    self.diagnostics.push(Diagnostic::discovery(
                        Some(file.path.clone()),
                        format!("duplicate class {}; keeping the first declaration", class.name),
                    ));
                    continue;
                }
                self.by_name.insert(class.name.clone(), self.classes.len());
                self.classes.push(class);
            }
        }
        self.resolve_constants();
    }

    /// Replaces constant references in `dataProvider` and `name` with the
    /// literal values of the constants they point at.
    fn resolve_constants(&mut self) {
        let mut resolved_tests = Vec::new();
        let mut resolved_providers = Vec::new();

        for (class_idx, class) in self.classes.iter().enumerate() {
            for (idx, test) in class.tests.iter().enumerate() {
                if let Some(constant) = &test.provider_constant {
                    resolved_tests.push((class_idx, idx, self.constant(constant).map(str::to_string)));
                }
            }
            for (idx, provider) in class.providers.iter().enumerate() {
                if let Some(constant) = &provider.name_constant {
                    resolved_providers.push((class_idx, idx, self.constant(constant).map(str::to_string)));
                }
            }
        }

        for (class_idx, idx, value) in resolved_tests {
            let test = &mut self.classes[class_idx].tests[idx];
            let Some(constant) = test.provider_constant.take() else {
                continue;
            };
            match value {
                Some(value) => test.descriptor.provider_name = value,
                None => self.diagnostics.push(Diagnostic::discovery(
                    None,
                    format!(
                        "{}: dataProvider constant {}.{} could not be resolved",
                        test.descriptor.qualified_name(),
                        constant.class,
                        constant.field
                    ),
                )),
            }
        }

        for (class_idx, idx, value) in resolved_providers {
            let provider = &mut self.classes[class_idx].providers[idx];
            let Some(constant) = provider.name_constant.take() else {
                continue;
            };
            match value {
                Some(value) => provider.descriptor.name = value,
                None => self.diagnostics.push(Diagnostic::discovery(
                    None,
                    format!(
                        "{}: data provider name constant {}.{} could not be resolved",
                        provider.descriptor.qualified_name(),
                        constant.class,
                        constant.field
                    ),
                )),
            }
        }
    }

    pub fn constant(&self, constant: &ConstantRef) -> Option<&str> {
        self.get(&constant.class)?
            .constants
            .get(&constant.field)
            .map(String::as_str)
    }

    pub fn get(&self, name: &ClassRef) -> Option<&JavaClass> {
        self.by_name.get(name).map(|&idx| &self.classes[idx])
    }

    pub fn classes(&self) -> impl Iterator<Item = &JavaClass> {
        self.classes.iter()
    }

    /// Classes whose package is `package` or nested below it.
    pub fn within<'a>(&'a self, package: &'a str) -> impl Iterator<Item = &'a JavaClass> + 'a {
        self.classes.iter().filter(move |c| c.name.is_within(package))
    }

    pub fn tests_within(&self, package: &str) -> Vec<TestDescriptor> {
        self.within(package)
            .flat_map(|c| c.tests.iter().map(|t| t.descriptor.clone()))
            .collect()
    }

    pub fn providers_within(&self, package: &str) -> Vec<ProviderDescriptor> {
        self.within(package)
            .flat_map(|c| c.providers.iter().map(|p| p.descriptor.clone()))
            .collect()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn parse(path: &str, source: &str) -> ParsedFile {
        JavaParser::new()
            .unwrap()
            .parse_source(source, Path::new(path))
            .unwrap()
    }

    const NAMES: &str = r#"
package counttests.data;
public interface Names {
    String USERS = "users";
}
"#;

    const USERS: &str = r#"
package counttests.data;
import org.testng.annotations.DataProvider;
public class UserProviders {
    public static final String ADMINS = "admins";

    @DataProvider(name = Names.USERS)
    public static Object[][] users() { return new Object[][] { {1}, {2} }; }

    @DataProvider(name = ADMINS)
    public static Object[][] admins() { return new Object[][] { {1} }; }
}
"#;

    const USER_TEST: &str = r#"
package counttests.users;
import org.testng.annotations.Test;
import counttests.data.Names;
import counttests.data.UserProviders;
public class UserTest {
    @Test(dataProvider = Names.USERS, dataProviderClass = UserProviders.class)
    public void create(int id) {}

    @Test(dataProvider = Names.MISSING, dataProviderClass = UserProviders.class)
    public void delete(int id) {}
}
"#;

    fn index() -> ClassIndex {
        ClassIndex::from_files([
            parse("Names.java", NAMES),
            parse("UserProviders.java", USERS),
            parse("UserTest.java", USER_TEST),
        ])
    }

    #[test]
    fn test_indexes_classes_by_name() {
        let index = index();
        assert_eq!(index.len(), 3);
        assert!(index.get(&ClassRef::new("counttests.users.UserTest")).is_some());
        assert!(index.get(&ClassRef::new("counttests.UserTest")).is_none());
    }

    #[test]
    fn test_resolves_constant_names() {
        let index = index();
        let providers = index.providers_within("counttests.data");
        let names: Vec<&str> = providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["users", "admins"]);

        let tests = index.tests_within("counttests.users");
        assert_eq!(tests[0].provider_name, "users");
        assert_eq!(tests[1].provider_name, "Names.MISSING");
        assert!(index
            .diagnostics()
            .iter()
            .any(|d| d.to_string().contains("counttests.data.Names.MISSING")));
    }

    #[test]
    fn test_package_filtering() {
        let index = index();
        assert_eq!(index.within("counttests").count(), 3);
        assert_eq!(index.within("counttests.users").count(), 1);
        assert_eq!(index.within("counttests.user").count(), 0);
    }

    #[test]
    fn test_duplicate_classes_keep_first() {
        let index = ClassIndex::from_files([
            parse("a/UserTest.java", USER_TEST),
            parse("b/UserTest.java", USER_TEST),
        ]);
        assert_eq!(index.len(), 1);
        assert!(index.diagnostics()[0].to_string().starts_with("b/UserTest.java"));
    }

    #[test]
    fn test_build_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("counttests/data");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Names.java"), NAMES).unwrap();
        fs::write(dir.join("UserProviders.java"), USERS).unwrap();

        let missing = temp_dir.path().join("missing");
        let index = ClassIndex::build(&[temp_dir.path().to_path_buf(), missing], &[]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.diagnostics().len(), 1);
        assert!(index.diagnostics()[0].to_string().contains("directory not found"));
    }
}
