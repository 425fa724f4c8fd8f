use tracing::debug;

use super::{ClassIndex, DescriptorSet};
use crate::utils::join_package;

/// Collects the census inputs for a package scan.
///
/// Tests come from classes within `root.sub`; providers come from every
/// class within `root`, so a test in a sub-package can still resolve a
/// provider declared elsewhere under the root.
pub fn scan_package(index: &ClassIndex, root_package: &str, sub_package: &str) -> DescriptorSet {
    let test_package = join_package(root_package, sub_package);
    let set = DescriptorSet {
        tests: index.tests_within(&test_package),
        providers: index.providers_within(root_package),
        diagnostics: index.diagnostics().to_vec(),
    };
    debug!(
        package = %test_package,
        tests = set.tests.len(),
        providers = set.providers.len(),
        "scanned package"
    );
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::JavaParser;
    use std::path::Path;

    fn index() -> ClassIndex {
        let mut parser = JavaParser::new().unwrap();
        let files = [
            (
                "counttests/RootTest.java",
                r#"package counttests;
                public class RootTest {
                    @Test public void root() {}
                    @DataProvider(name = "shared")
                    public static Object[][] shared() { return new Object[][] { {1}, {2} }; }
                }"#,
            ),
            (
                "counttests/login/LoginTest.java",
                r#"package counttests.login;
                public class LoginTest {
                    @Test(dataProvider = "shared", dataProviderClass = counttests.RootTest.class)
                    public void login(int n) {}
                    @Test(enabled = false) public void skipped() {}
                }"#,
            ),
            (
                "counttestsextra/OtherTest.java",
                r#"package counttestsextra;
                public class OtherTest {
                    @Test public void other() {}
                }"#,
            ),
        ];
        ClassIndex::from_files(
            files
                .iter()
                .map(|(path, source)| parser.parse_source(source, Path::new(path)).unwrap()),
        )
    }

    #[test]
    fn test_whole_root_package() {
        let set = scan_package(&index(), "counttests", "");
        let names: Vec<String> = set.tests.iter().map(|t| t.qualified_name()).collect();
        assert_eq!(
            names,
            vec![
                "counttests.RootTest.root",
                "counttests.login.LoginTest.login",
                "counttests.login.LoginTest.skipped",
            ]
        );
        assert_eq!(set.providers.len(), 1);
    }

    #[test]
    fn test_sub_package_keeps_root_providers() {
        let set = scan_package(&index(), "counttests", "login");
        assert_eq!(set.tests.len(), 2);
        assert_eq!(set.providers.len(), 1);
        assert_eq!(set.providers[0].name, "shared");
    }

    #[test]
    fn test_unknown_package_is_empty() {
        let set = scan_package(&index(), "counttests", "checkout");
        assert!(set.tests.is_empty());
    }
}
