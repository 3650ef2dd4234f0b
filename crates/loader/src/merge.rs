//! Folding extracted REST configurations into the shared context.

use indexmap::IndexMap;
use switchyard_core::{ContextError, ExecutionContext, RestConfigurationDefinition};
use tracing::debug;

/// Resolve every definition against `context`, then append them as one batch.
///
/// Nothing is appended unless every definition resolves and none conflicts
/// with what the context already holds. Returns the number of entries added.
pub fn merge(
    context: &ExecutionContext,
    definitions: &IndexMap<String, RestConfigurationDefinition>,
) -> Result<usize, ContextError> {
    let batch = definitions
        .iter()
        .map(|(key, definition)| {
            definition.as_rest_configuration(context).inspect_err(|e| {
                debug!(component = %key, error = %e, "rest configuration rejected");
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    context.add_rest_configurations(batch)
}
