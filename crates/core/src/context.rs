//! The shared execution context that accumulates state across loads.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::debug;

use crate::error::ContextError;
use crate::rest::RestConfiguration;

/// Process-wide state shared by reference between every load directed at it.
///
/// Properties are fixed at construction. REST configurations form an
/// append-only collection guarded by a lock; a batch is appended under a
/// single write lock so concurrent loads never interleave partial batches.
#[derive(Debug)]
pub struct ExecutionContext {
    name: String,
    properties: BTreeMap<String, String>,
    rest_configurations: RwLock<Vec<RestConfiguration>>,
}

impl ExecutionContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_properties(name, BTreeMap::new())
    }

    pub fn with_properties(name: impl Into<String>, properties: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            properties,
            rest_configurations: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Replace every `{{key}}` (or `{{key:default}}`) in `text` with its property value.
    pub fn resolve_placeholders(&self, text: &str) -> Result<String, ContextError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| ContextError::MalformedPlaceholder(text.to_string()))?;
            let token = after[..end].trim();
            if token.is_empty() {
                return Err(ContextError::MalformedPlaceholder(text.to_string()));
            }

            let (key, default) = match token.split_once(':') {
                Some((key, default)) => (key.trim(), Some(default)),
                None => (token, None),
            };
            match (self.properties.get(key), default) {
                (Some(value), _) => out.push_str(value),
                (None, Some(default)) => out.push_str(default),
                (None, None) => return Err(ContextError::UnresolvedPlaceholder(key.to_string())),
            }

            rest = &after[end + 2..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Append a batch of REST configurations atomically.
    ///
    /// The whole batch is checked for conflicts before anything is appended: an
    /// entry conflicts when another entry for the same component (already held,
    /// or earlier in the batch) has different settings. Returns the number of
    /// entries appended.
    pub fn add_rest_configurations(
        &self,
        batch: Vec<RestConfiguration>,
    ) -> Result<usize, ContextError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut guard = self
            .rest_configurations
            .write()
            .expect("rest_configurations lock poisoned");

        for (i, candidate) in batch.iter().enumerate() {
            let conflicting = guard
                .iter()
                .chain(batch[..i].iter())
                .any(|held| held.component_key() == candidate.component_key() && held != candidate);
            if conflicting {
                return Err(ContextError::ConflictingRestConfiguration(
                    candidate.component_key().to_string(),
                ));
            }
        }

        let count = batch.len();
        guard.extend(batch);
        debug!(context = %self.name, added = count, total = guard.len(), "appended rest configurations");
        Ok(count)
    }

    /// Append a single REST configuration.
    pub fn add_rest_configuration(&self, configuration: RestConfiguration) -> Result<(), ContextError> {
        self.add_rest_configurations(vec![configuration]).map(|_| ())
    }

    /// Snapshot of every REST configuration held, in append order.
    pub fn rest_configurations(&self) -> Vec<RestConfiguration> {
        self.rest_configurations
            .read()
            .expect("rest_configurations lock poisoned")
            .clone()
    }

    /// First configuration registered for `component` (`""` for the default one).
    pub fn rest_configuration(&self, component: &str) -> Option<RestConfiguration> {
        self.rest_configurations
            .read()
            .expect("rest_configurations lock poisoned")
            .iter()
            .find(|c| c.component_key() == component)
            .cloned()
    }

    pub fn rest_configuration_count(&self) -> usize {
        self.rest_configurations
            .read()
            .expect("rest_configurations lock poisoned")
            .len()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new("switchyard")
    }
}
