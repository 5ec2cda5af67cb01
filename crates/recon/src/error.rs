use std::fmt;

use crate::frame::EncodingKind;
use crate::predictor::PredictError;

/// Why one encoding did not yield a price.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptCause {
    /// The model rejected the frame.
    Model(PredictError),
    /// The model returned other than exactly one value.
    Shape { len: usize },
    /// The model returned NaN or an infinity.
    NonFinite(f64),
}

impl fmt::Display for AttemptCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(e) => write!(f, "{e}"),
            Self::Shape { len } => write!(f, "expected exactly one predicted value, got {len}"),
            Self::NonFinite(v) => write!(f, "predicted value is not finite ({v})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFailure {
    pub encoding: EncodingKind,
    pub cause: AttemptCause,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.encoding, self.cause)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconError {
    /// The model's schema names columns the chosen encoding cannot supply
    /// (or, in strict mode, the encoding carries columns the schema omits).
    SchemaMismatch {
        encoding: EncodingKind,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    /// Every encoding handed to the model failed. One entry per attempt, in order.
    PredictionFailure { attempts: Vec<AttemptFailure> },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaMismatch { encoding, missing, unexpected } => {
                write!(f, "model schema does not fit the {encoding} encoding:")?;
                if !missing.is_empty() {
                    write!(f, " missing columns [{}]", missing.join(", "))?;
                }
                if !unexpected.is_empty() {
                    if !missing.is_empty() {
                        write!(f, ";")?;
                    }
                    write!(f, " unexpected columns [{}]", unexpected.join(", "))?;
                }
                Ok(())
            }
            Self::PredictionFailure { attempts } => match attempts.as_slice() {
                [only] => write!(f, "prediction failed ({only})"),
                all => {
                    let causes: Vec<String> = all.iter().map(|a| a.to_string()).collect();
                    write!(f, "prediction failed for every encoding: {}", causes.join("; "))
                }
            },
        }
    }
}

impl std::error::Error for ReconError {}
