use crate::model::TestDescriptor;

/// Whether a test takes part in a census under the given filter.
pub fn is_counted(test: &TestDescriptor, only_enabled: bool) -> bool {
    !only_enabled || test.enabled
}

/// Number of tagged test methods, without provider expansion.
pub fn count_annotated(tests: &[TestDescriptor], only_enabled: bool) -> usize {
    tests
        .iter()
        .filter(|test| is_counted(test, only_enabled))
        .count()
}
