//! `griya-model`: trained model artifacts.
//!
//! An artifact is a JSON document holding a fitted linear pipeline plus the
//! metadata the reconciler inspects: the column names it was fit on and,
//! for artifacts written by newer training runs, the encoding it expects.
//! It is read once at startup and shared read-only afterwards.

pub mod artifact;
pub mod error;
pub mod linear;

pub use artifact::{load, ArtifactFile, LoadedModel, ARTIFACT_FORMAT, ARTIFACT_VERSION};
pub use error::LoadError;
pub use linear::{LinearPipeline, UnknownCategory};
