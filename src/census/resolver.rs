use tracing::trace;

use crate::model::{ClassRef, ProviderDescriptor, TestDescriptor};

/// Class in which a test's data provider is looked up: the
/// `dataProviderClass` override when present, else the declaring class.
pub fn search_class(test: &TestDescriptor) -> &ClassRef {
    test.provider_class
        .as_ref()
        .unwrap_or(&test.declaring_class)
}

/// Finds the provider named `provider_name` declared in exactly
/// `search_class`.
///
/// Classes are compared by fully-qualified name only; a provider inherited
/// from a superclass does not match. When several providers share the same
/// name and class the first one in `providers` wins.
pub fn resolve<'p>(
    provider_name: &str,
    search_class: &ClassRef,
    providers: &'p [ProviderDescriptor],
) -> Option<&'p ProviderDescriptor> {
    let found = providers
        .iter()
        .find(|p| p.name == provider_name && &p.declaring_class == search_class);
    trace!(
        provider = provider_name,
        class = %search_class,
        found = found.is_some(),
        "resolved data provider"
    );
    found
}
