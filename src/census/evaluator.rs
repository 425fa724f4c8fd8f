use tracing::debug;

use crate::error::InvocationError;
use crate::invoke::{ProviderInvoker, ProviderOutput};
use crate::model::ProviderDescriptor;

/// Number of test cases a provider yields.
///
/// A fixed table contributes its row count. A lazy sequence is drained once
/// and contributes the number of items it produced. The output must match
/// the shape the provider was declared with.
pub fn evaluate(
    provider: &ProviderDescriptor,
    invoker: &dyn ProviderInvoker,
) -> Result<usize, InvocationError> {
    let output = invoker.invoke(provider)?;

    let found = output.shape();
    if found != provider.return_shape {
        return Err(InvocationError::ShapeMismatch {
            provider: provider.qualified_name(),
            expected: provider.return_shape,
            found,
        });
    }

    let cardinality = match output {
        ProviderOutput::Table(rows) => rows.len(),
        ProviderOutput::Blank(rows) => rows,
        ProviderOutput::Sequence(rows) => rows.count(),
    };
    debug!(
        provider = %provider.qualified_name(),
        shape = %provider.return_shape,
        cardinality,
        "evaluated data provider"
    );
    Ok(cardinality)
}
