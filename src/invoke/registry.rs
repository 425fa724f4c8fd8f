use std::collections::HashMap;

use tracing::trace;

use super::{ProviderInvoker, ProviderOutput, Row};
use crate::error::InvocationError;
use crate::model::{ClassRef, ProviderDescriptor};

type ProviderFn = Box<dyn Fn() -> Result<ProviderOutput, InvocationError>>;

/// Invoker backed by closures registered ahead of time.
///
/// Entries are keyed by `(declaring class, provider name)`, the same pair
/// that identifies a provider during resolution. Each call runs the closure
/// again, so sequences are rebuilt rather than shared between calls.
#[derive(Default)]
pub struct RegistryInvoker {
    providers: HashMap<(ClassRef, String), ProviderFn>,
}

impl RegistryInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, class: impl Into<ClassRef>, name: impl Into<String>, f: F)
    where
        F: Fn() -> Result<ProviderOutput, InvocationError> + 'static,
    {
        self.providers
            .insert((class.into(), name.into()), Box::new(f));
    }

    pub fn register_table(
        &mut self,
        class: impl Into<ClassRef>,
        name: impl Into<String>,
        rows: Vec<Row>,
    ) {
        self.register(class, name, move || Ok(ProviderOutput::Table(rows.clone())));
    }

    pub fn register_sequence<F, I>(&mut self, class: impl Into<ClassRef>, name: impl Into<String>, f: F)
    where
        F: Fn() -> I + 'static,
        I: Iterator<Item = Row> + 'static,
    {
        self.register(class, name, move || Ok(ProviderOutput::Sequence(Box::new(f()))));
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ProviderInvoker for RegistryInvoker {
    fn invoke(&self, provider: &ProviderDescriptor) -> Result<ProviderOutput, InvocationError> {
        trace!(provider = %provider.qualified_name(), "invoking registered provider");
        let key = (provider.declaring_class.clone(), provider.name.clone());
        let f = self
            .providers
            .get(&key)
            .ok_or_else(|| InvocationError::not_registered(provider.qualified_name()))?;
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReturnShape;

    #[test]
    fn test_registered_table_is_returned() {
        let mut invoker = RegistryInvoker::new();
        invoker.register_table("a.B", "rows", vec![vec!["1".into()], vec!["2".into()]]);

        let provider = ProviderDescriptor::new("rows", "a.B", ReturnShape::FixedTable);
        match invoker.invoke(&provider).unwrap() {
            ProviderOutput::Table(rows) => assert_eq!(rows.len(), 2),
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_sequence_is_rebuilt_per_call() {
        let mut invoker = RegistryInvoker::new();
        invoker.register_sequence("a.B", "stream", || (0..3).map(|i| vec![i.to_string()]));

        let provider = ProviderDescriptor::new("stream", "a.B", ReturnShape::LazySequence);
        for _ in 0..2 {
            match invoker.invoke(&provider).unwrap() {
                ProviderOutput::Sequence(rows) => assert_eq!(rows.count(), 3),
                other => panic!("expected sequence, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_same_name_in_other_class_is_not_registered() {
        let mut invoker = RegistryInvoker::new();
        invoker.register_table("a.B", "rows", vec![]);

        let provider = ProviderDescriptor::new("rows", "a.C", ReturnShape::FixedTable);
        let err = invoker.invoke(&provider).unwrap_err();
        assert_eq!(err, InvocationError::not_registered("a.C.rows"));
    }
}
