use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::rest::{RestConfigurationDefinition, RestDefinition};
use crate::route::RouteDefinition;

/// Everything one configured builder produced.
///
/// REST configurations are keyed by component (`""` for the default one) and
/// keep the order in which route code first touched them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteBundle {
    pub routes: Vec<RouteDefinition>,
    pub rests: Vec<RestDefinition>,
    pub rest_configurations: IndexMap<String, RestConfigurationDefinition>,
}

impl RouteBundle {
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.rests.is_empty() && self.rest_configurations.is_empty()
    }

    /// Route ids, falling back to the consumer URI for unnamed routes.
    pub fn route_labels(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|r| r.id.clone().unwrap_or_else(|| r.from.clone()))
            .collect()
    }
}
