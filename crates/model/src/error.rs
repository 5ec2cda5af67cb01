use std::fmt;
use std::path::PathBuf;

/// The artifact could not be turned into a usable model. Fatal at startup.
#[derive(Debug)]
pub enum LoadError {
    /// File could not be read.
    Io { path: PathBuf, message: String },
    /// Not valid JSON, or not shaped like an artifact.
    Parse(String),
    /// Well-formed but unusable (unknown format, bad version, inconsistent columns).
    Invalid(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "cannot read model {}: {message}", path.display()),
            Self::Parse(msg) => write!(f, "cannot parse model artifact: {msg}"),
            Self::Invalid(msg) => write!(f, "invalid model artifact: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {}
