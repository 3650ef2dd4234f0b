//! Turning a [`Source`] location into a readable byte stream.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use switchyard_core::Source;
use tracing::debug;

/// Errors raised while obtaining source content.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("unsupported resource scheme '{scheme}' in '{location}'")]
    UnsupportedScheme { scheme: String, location: String },

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("environment variable '{0}' is not set")]
    MissingVariable(String),

    #[error("failed to read '{location}': {source}")]
    Io {
        location: String,
        source: std::io::Error,
    },

    #[error("content of '{location}' is not valid UTF-8: {source}")]
    InvalidUtf8 {
        location: String,
        source: std::string::FromUtf8Error,
    },
}

/// Opens the content behind a source location.
///
/// The returned stream is owned by the caller and closed when dropped.
pub trait SourceResolver: Send + Sync {
    fn resolve(&self, source: &Source) -> Result<Box<dyn Read + Send>, ResolutionError>;
}

/// Resolves `file:`, `classpath:`, `env:` and `inline:` locations.
///
/// Locations without a scheme are looked up on the classpath.
#[derive(Debug, Clone, Default)]
pub struct UriResolver {
    classpath: Vec<PathBuf>,
}

impl UriResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver searching `roots`, in order, for `classpath:` locations.
    pub fn with_classpath(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            classpath: roots.into_iter().collect(),
        }
    }

    pub fn add_classpath_root(&mut self, root: impl Into<PathBuf>) {
        self.classpath.push(root.into());
    }

    pub fn classpath(&self) -> &[PathBuf] {
        &self.classpath
    }

    fn open_file(&self, path: &Path, location: &str) -> Result<Box<dyn Read + Send>, ResolutionError> {
        match File::open(path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ResolutionError::NotFound(location.to_string()))
            }
            Err(source) => Err(ResolutionError::Io {
                location: location.to_string(),
                source,
            }),
        }
    }

    fn find_on_classpath(&self, resource: &str) -> Option<PathBuf> {
        let relative = resource.trim_start_matches('/');
        if relative.is_empty() {
            return None;
        }
        self.classpath
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.is_file())
    }
}

impl SourceResolver for UriResolver {
    fn resolve(&self, source: &Source) -> Result<Box<dyn Read + Send>, ResolutionError> {
        let location = source.location();
        let (scheme, rest) = location.split_once(':').unwrap_or(("classpath", location));

        debug!(location = %location, scheme = %scheme, "resolving source");
        match scheme {
            "file" => {
                let path = rest.strip_prefix("//").unwrap_or(rest);
                self.open_file(Path::new(path), location)
            }
            "classpath" => {
                let path = self
                    .find_on_classpath(rest)
                    .ok_or_else(|| ResolutionError::NotFound(location.to_string()))?;
                debug!(location = %location, path = %path.display(), "found on classpath");
                self.open_file(&path, location)
            }
            "env" => {
                let content = std::env::var(rest)
                    .map_err(|_| ResolutionError::MissingVariable(rest.to_string()))?;
                Ok(Box::new(Cursor::new(content.into_bytes())))
            }
            "inline" => Ok(Box::new(Cursor::new(rest.as_bytes().to_vec()))),
            other => Err(ResolutionError::UnsupportedScheme {
                scheme: other.to_string(),
                location: location.to_string(),
            }),
        }
    }
}

/// Read the whole stream as UTF-8, releasing it before returning.
pub fn read_content(
    resolver: &dyn SourceResolver,
    source: &Source,
) -> Result<String, ResolutionError> {
    let mut stream = resolver.resolve(source)?;
    let mut bytes = Vec::new();
    stream
        .read_to_end(&mut bytes)
        .map_err(|e| ResolutionError::Io {
            location: source.location().to_string(),
            source: e,
        })?;
    drop(stream);

    String::from_utf8(bytes).map_err(|e| ResolutionError::InvalidUtf8 {
        location: source.location().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn read(resolver: &UriResolver, location: &str) -> Result<String, ResolutionError> {
        read_content(resolver, &Source::new("Routes.java", location, "java"))
    }

    #[test]
    fn reads_file_locations() {
        let dir = TempDir::new().expect("create tempdir");
        let path = dir.path().join("Routes.java");
        fs::write(&path, "package a;").unwrap();

        let resolver = UriResolver::new();
        let location = format!("file:{}", path.display());
        assert_eq!(read(&resolver, &location).unwrap(), "package a;");
    }

    #[test]
    fn classpath_roots_are_searched_in_order() {
        let first = TempDir::new().expect("create tempdir");
        let second = TempDir::new().expect("create tempdir");
        fs::create_dir_all(second.path().join("routes")).unwrap();
        fs::write(second.path().join("routes/Routes.java"), "second").unwrap();

        let mut resolver = UriResolver::with_classpath([first.path().to_path_buf()]);
        resolver.add_classpath_root(second.path());
        assert_eq!(read(&resolver, "classpath:routes/Routes.java").unwrap(), "second");
        assert_eq!(read(&resolver, "routes/Routes.java").unwrap(), "second");

        fs::create_dir_all(first.path().join("routes")).unwrap();
        fs::write(first.path().join("routes/Routes.java"), "first").unwrap();
        assert_eq!(read(&resolver, "classpath:/routes/Routes.java").unwrap(), "first");
    }

    #[test]
    fn missing_resources_are_not_found() {
        let dir = TempDir::new().expect("create tempdir");
        let resolver = UriResolver::with_classpath([dir.path().to_path_buf()]);

        assert!(matches!(
            read(&resolver, "classpath:Nope.java"),
            Err(ResolutionError::NotFound(l)) if l == "classpath:Nope.java"
        ));
        let location = format!("file:{}", dir.path().join("Nope.java").display());
        assert!(matches!(read(&resolver, &location), Err(ResolutionError::NotFound(_))));
    }

    #[test]
    fn inline_and_env_locations() {
        let resolver = UriResolver::new();
        assert_eq!(read(&resolver, "inline:package a; class X {}").unwrap(), "package a; class X {}");

        assert!(matches!(
            read(&resolver, "env:SWITCHYARD_TEST_UNSET_ROUTE_VARIABLE"),
            Err(ResolutionError::MissingVariable(v)) if v == "SWITCHYARD_TEST_UNSET_ROUTE_VARIABLE"
        ));
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let err = read(&UriResolver::new(), "http://example.com/Routes.java").unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::UnsupportedScheme { ref scheme, .. } if scheme == "http"
        ));
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let dir = TempDir::new().expect("create tempdir");
        let path = dir.path().join("Routes.java");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let location = format!("file:{}", path.display());
        assert!(matches!(
            read(&UriResolver::new(), &location),
            Err(ResolutionError::InvalidUtf8 { .. })
        ));
    }
}
