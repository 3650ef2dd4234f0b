//! Source descriptors handed to a loader.

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// A named piece of route source: where to read it from and which language it is in.
///
/// Immutable once built. Loaders only ever read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    name: String,
    location: String,
    language: String,
}

impl Source {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            language: language.into(),
        }
    }

    /// Parse a location such as `file:routes/Routes.java` or
    /// `classpath:Routes.txt?language=java`.
    ///
    /// The name is the last path segment of the location. The language is taken
    /// from the `language` query parameter, falling back to the name's extension.
    pub fn from_uri(uri: &str) -> Result<Self, SourceError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(SourceError::Empty);
        }

        let (location, query) = match uri.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (uri, None),
        };
        if location.is_empty() {
            return Err(SourceError::Empty);
        }

        let language = query.and_then(|q| {
            q.split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == "language")
                .map(|(_, value)| value.to_string())
        });

        let path = location.split_once(':').map_or(location, |(_, rest)| rest);
        let name = path
            .rsplit(&['/', '\\'][..])
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or(path)
            .to_string();

        let language = match language.filter(|l| !l.is_empty()) {
            Some(language) => language,
            None => name
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_string())
                .filter(|ext| !ext.is_empty())
                .ok_or_else(|| SourceError::MissingLanguage(uri.to_string()))?,
        };

        Ok(Self {
            name,
            location: location.to_string(),
            language,
        })
    }

    /// Logical name, usually a file name such as `Routes.java`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opaque location handed to the resolver (`scheme:path`).
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Declared language tag.
    pub fn language(&self) -> &str {
        &self.language
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.location, self.language)
    }
}
