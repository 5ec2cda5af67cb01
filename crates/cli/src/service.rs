//! Request boundary: one form submission in, one display result out.
//!
//! Every per-request failure ends here as a message. Only loading the model
//! can fail the process, and that happens before a `Service` exists.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use griya_config::Settings;
use griya_core::{format_rupiah, validate_sizes, FormProfile, PropertyRecord, ValidationFailure};
use griya_model::{LoadError, LoadedModel};
use griya_protocol::DisplayResult;
use griya_recon::{
    reconcile, sniff, DecisionPath, EncodingKind, Predictor, ReconError, ReconOptions, SchemaVerdict,
};
use serde::Serialize;

/// Per-request behaviour, taken from settings and command-line flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceOptions {
    pub profile: FormProfile,
    pub strict_schema: bool,
    pub validate_sizes: bool,
    pub currency_prefix: String,
}

impl ServiceOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            profile: settings.profile,
            strict_schema: settings.strict_schema,
            validate_sizes: settings.validate_sizes,
            currency_prefix: settings.currency_prefix.clone(),
        }
    }
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// Rejected before the model was consulted.
    Validation(ValidationFailure),
    Recon(ReconError),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "{e}"),
            Self::Recon(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SubmitError {}

impl From<ValidationFailure> for SubmitError {
    fn from(e: ValidationFailure) -> Self {
        Self::Validation(e)
    }
}

impl From<ReconError> for SubmitError {
    fn from(e: ReconError) -> Self {
        Self::Recon(e)
    }
}

/// A successful submission with enough detail to explain how it was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub price: f64,
    pub display: String,
    pub encoding: EncodingKind,
    pub path: DecisionPath,
    pub attempts: Vec<EncodingKind>,
}

/// What the loaded model declares about its input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaReport {
    pub expected_columns: Option<Vec<String>>,
    pub verdict: Option<SchemaVerdict>,
    pub declared_encoding: Option<EncodingKind>,
    pub fingerprint: String,
    pub source: Option<PathBuf>,
}

/// Shared by every request. Cloning shares the model.
#[derive(Debug, Clone)]
pub struct Service {
    model: Arc<LoadedModel>,
    options: ServiceOptions,
}

impl Service {
    pub fn new(model: Arc<LoadedModel>, options: ServiceOptions) -> Self {
        Self { model, options }
    }

    /// Load the configured model artifact. Failure here is fatal to the caller.
    pub fn load(model_path: &std::path::Path, options: ServiceOptions) -> Result<Self, LoadError> {
        let model = griya_model::load(model_path)?;
        Ok(Self::new(Arc::new(model), options))
    }

    pub fn model(&self) -> &LoadedModel {
        &self.model
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Range check, optional size validation, reconcile, format.
    pub fn estimate(&self, mut record: PropertyRecord) -> Result<Estimate, SubmitError> {
        self.options.profile.fill_extras(&mut record);
        self.options.profile.check(&record)?;
        if self.options.validate_sizes {
            validate_sizes(&record)?;
        }

        let reconciled = reconcile(
            &record,
            self.model.as_ref(),
            ReconOptions { strict: self.options.strict_schema },
        )?;
        log::debug!(
            "estimate {} via {} ({})",
            reconciled.price,
            reconciled.encoding,
            reconciled.path
        );

        Ok(Estimate {
            display: format_rupiah(&self.options.currency_prefix, reconciled.price),
            price: reconciled.price,
            encoding: reconciled.encoding,
            path: reconciled.path,
            attempts: reconciled.attempts,
        })
    }

    /// The form's view of `estimate`.
    pub fn submit(&self, record: PropertyRecord) -> DisplayResult {
        match self.estimate(record) {
            Ok(estimate) => DisplayResult::Ok { price: estimate.price, display: estimate.display },
            Err(e) => {
                log::warn!("submission rejected: {e}");
                DisplayResult::error(e.to_string())
            }
        }
    }

    pub fn schema_report(&self) -> SchemaReport {
        let schema = self.model.expected_schema();
        SchemaReport {
            expected_columns: schema.map(|s| s.columns().to_vec()),
            verdict: schema.map(sniff),
            declared_encoding: self.model.declared_encoding(),
            fingerprint: self.model.fingerprint().to_string(),
            source: self.model.source().map(|p| p.to_path_buf()),
        }
    }
}
