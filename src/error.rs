use std::fmt::{Display, Formatter};

/// Top-level error for the load/resolve/build pipeline.
///
/// Every stage surfaces its failure through this enum; construction of a
/// [`crate::SwaggerApi`] either fully succeeds or fails as a whole, no
/// partial model is ever returned.
#[derive(Debug)]
pub enum Error {
    /// The description source was unreachable or its content unparsable.
    Load(LoadError),

    /// One or more `$ref` pointers could not be resolved. Carries the full
    /// set of failures, not just the first one.
    Resolution(ResolutionError),

    /// The document declares no version, or a version with no registered
    /// strategy.
    UnsupportedVersion(Option<String>),

    /// The resolved document structurally violates the version's schema.
    /// Aggregates every issue found.
    Validation(Vec<String>),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Load(load_error) => write!(f, "Load: {}", load_error),
            Error::Resolution(resolution_error) => write!(f, "Resolution: {}", resolution_error),
            Error::UnsupportedVersion(Some(version)) => {
                write!(
                    f,
                    "UnsupportedVersion: Version '{version}' is not supported/valid."
                )
            }
            Error::UnsupportedVersion(None) => {
                write!(
                    f,
                    "UnsupportedVersion: The document does not declare a swagger version."
                )
            }
            Error::Validation(issues) => {
                write!(f, "Validation: {}", issues.join("; "))
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Load(load_error) => Some(load_error),
            Error::Resolution(resolution_error) => Some(resolution_error),
            _ => None,
        }
    }
}

impl From<LoadError> for Error {
    fn from(load_error: LoadError) -> Self {
        Error::Load(load_error)
    }
}

impl From<ResolutionError> for Error {
    fn from(resolution_error: ResolutionError) -> Self {
        Error::Resolution(resolution_error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// The location could not be read or fetched.
    Unreachable,

    /// The content was fetched but is not valid YAML or JSON.
    Unparsable,
}

/// Failure to turn a description source into an in-memory document.
#[derive(Debug)]
pub struct LoadError {
    pub location: String,
    pub kind: LoadErrorKind,
    pub detail: String,
}

impl LoadError {
    pub(crate) fn unreachable(location: &str, detail: impl Display) -> Self {
        Self {
            location: location.to_string(),
            kind: LoadErrorKind::Unreachable,
            detail: detail.to_string(),
        }
    }

    pub(crate) fn unparsable(location: &str, detail: impl Display) -> Self {
        Self {
            location: location.to_string(),
            kind: LoadErrorKind::Unparsable,
            detail: detail.to_string(),
        }
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            LoadErrorKind::Unreachable => {
                write!(f, "Could not reach '{}': {}", self.location, self.detail)
            }
            LoadErrorKind::Unparsable => {
                write!(f, "Could not parse '{}': {}", self.location, self.detail)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// One unresolved `$ref` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    /// Pointer to the `$ref` occurrence in its document.
    pub ptr: String,

    /// The reference string as written in the document.
    pub ref_string: String,

    pub reason: String,
}

impl Display for ResolutionFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> '{}' ({})",
            self.ptr, self.ref_string, self.reason
        )
    }
}

/// Aggregate of every `$ref` that failed to resolve in one pass.
#[derive(Debug, Default)]
pub struct ResolutionError {
    pub failures: Vec<ResolutionFailure>,
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to resolve {} reference(s): ", self.failures.len())?;
        for (index, failure) in self.failures.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolutionError {}
