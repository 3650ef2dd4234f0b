//! Running a builder's configuration and reading back what it produced.

use std::sync::Arc;

use switchyard_core::{ConfigureError, ExecutionContext, RouteBundle, RoutesBuilder};
use tracing::debug;

/// Bind `context`, run `configure()` once, and collect the builder's definitions.
///
/// Instances without the route-builder capability produce an empty bundle.
/// A builder that never touched REST configuration yields an empty map.
pub fn extract(
    mut instance: Box<dyn RoutesBuilder>,
    context: &Arc<ExecutionContext>,
) -> Result<RouteBundle, ConfigureError> {
    let Some(builder) = instance.as_route_builder() else {
        debug!("instance is not a route builder, nothing to configure");
        return Ok(RouteBundle::default());
    };

    builder.set_context(Arc::clone(context));
    builder.configure()?;

    let definitions = instance.into_definitions();
    Ok(RouteBundle {
        routes: definitions.routes,
        rests: definitions.rests,
        rest_configurations: definitions.rest_configurations.unwrap_or_default(),
    })
}
