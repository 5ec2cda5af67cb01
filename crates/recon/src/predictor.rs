use std::fmt;
use std::sync::Arc;

use crate::frame::{EncodedFrame, EncodingKind};
use crate::schema::ExpectedSchema;

/// A loaded model as the reconciler sees it.
///
/// Implementations are read-only after load and may be shared across threads.
pub trait Predictor {
    /// Run the model on a single-row frame.
    fn predict(&self, frame: &EncodedFrame) -> Result<Vec<f64>, PredictError>;

    /// Column names the model was fit on, when it records them.
    fn expected_schema(&self) -> Option<&ExpectedSchema>;

    /// Encoding the artifact was tagged with at training time. Untagged
    /// artifacts return `None` and are classified from their schema instead.
    fn declared_encoding(&self) -> Option<EncodingKind> {
        None
    }
}

impl<P: Predictor + ?Sized> Predictor for Arc<P> {
    fn predict(&self, frame: &EncodedFrame) -> Result<Vec<f64>, PredictError> {
        (**self).predict(frame)
    }

    fn expected_schema(&self) -> Option<&ExpectedSchema> {
        (**self).expected_schema()
    }

    fn declared_encoding(&self) -> Option<EncodingKind> {
        (**self).declared_encoding()
    }
}

/// The model rejected its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictError {
    message: String,
}

impl PredictError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for PredictError {}
