//! `griya-recon`: Feature reconciliation engine.
//!
//! Pure engine crate: receives a property record and a model handle, picks the
//! input encoding the model accepts and returns the prediction.
//! No CLI or IO dependencies.

pub mod encode;
pub mod engine;
pub mod error;
pub mod frame;
pub mod predictor;
pub mod schema;

pub use encode::encode;
pub use engine::{reconcile, DecisionPath, ReconOptions, Reconciled};
pub use error::{AttemptCause, AttemptFailure, ReconError};
pub use frame::{EncodedFrame, EncodingKind, Value};
pub use predictor::{PredictError, Predictor};
pub use schema::{sniff, ExpectedSchema, SchemaVerdict};
