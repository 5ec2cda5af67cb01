use griya_core::PropertyRecord;
use serde::Serialize;

use crate::encode::{encode, OPTIONAL_NUMERIC_COLUMNS};
use crate::error::{AttemptCause, AttemptFailure, ReconError};
use crate::frame::{EncodedFrame, EncodingKind};
use crate::predictor::Predictor;
use crate::schema::{sniff, ExpectedSchema, SchemaVerdict};

/// Fallback order when the model gives no usable hint.
const FALLBACK_ORDER: [EncodingKind; 2] = [EncodingKind::Raw, EncodingKind::OneHot];

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconOptions {
    /// Require the encoded frame's column set to equal the schema's exactly.
    pub strict: bool,
}

/// Which rule picked the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPath {
    /// The artifact was tagged with its encoding.
    Declared,
    /// Schema names `city` and `furnishing` literally.
    SchemaRaw,
    /// Schema names every indicator column.
    SchemaOneHot,
    /// No schema, or a schema matching neither pattern: raw, then one-hot.
    Fallback,
}

impl std::fmt::Display for DecisionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Declared => write!(f, "declared"),
            Self::SchemaRaw => write!(f, "schema_raw"),
            Self::SchemaOneHot => write!(f, "schema_one_hot"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciled {
    pub price: f64,
    pub encoding: EncodingKind,
    pub path: DecisionPath,
    /// Encodings handed to the model, in order. The last one succeeded.
    pub attempts: Vec<EncodingKind>,
}

/// Pick the encoding `predictor` accepts for `record` and return its prediction.
///
/// Stateless: the same record and model always take the same path.
pub fn reconcile<P: Predictor + ?Sized>(
    record: &PropertyRecord,
    predictor: &P,
    options: ReconOptions,
) -> Result<Reconciled, ReconError> {
    let schema = predictor.expected_schema();

    if let Some(kind) = predictor.declared_encoding() {
        return run_directed(record, predictor, schema, kind, DecisionPath::Declared, options);
    }

    let Some(schema) = schema else {
        log::debug!("model exposes no schema; trying raw then one-hot");
        return run_fallback(record, predictor);
    };

    match sniff(schema) {
        SchemaVerdict::RawExpected => run_directed(
            record,
            predictor,
            Some(schema),
            EncodingKind::Raw,
            DecisionPath::SchemaRaw,
            options,
        ),
        SchemaVerdict::OneHotExpected => run_directed(
            record,
            predictor,
            Some(schema),
            EncodingKind::OneHot,
            DecisionPath::SchemaOneHot,
            options,
        ),
        SchemaVerdict::Unknown => {
            log::debug!(
                "schema of {} columns matches neither encoding; trying raw then one-hot",
                schema.len()
            );
            run_fallback(record, predictor)
        }
    }
}

fn run_directed<P: Predictor + ?Sized>(
    record: &PropertyRecord,
    predictor: &P,
    schema: Option<&ExpectedSchema>,
    kind: EncodingKind,
    path: DecisionPath,
    options: ReconOptions,
) -> Result<Reconciled, ReconError> {
    let frame = conform(encode(record, kind), schema, options)?;
    log::debug!("{path}: predicting with {kind} frame of {} columns", frame.len());

    match attempt(predictor, &frame) {
        Ok(price) => Ok(Reconciled { price, encoding: kind, path, attempts: vec![kind] }),
        Err(cause) => Err(ReconError::PredictionFailure {
            attempts: vec![AttemptFailure { encoding: kind, cause }],
        }),
    }
}

fn run_fallback<P: Predictor + ?Sized>(
    record: &PropertyRecord,
    predictor: &P,
) -> Result<Reconciled, ReconError> {
    let mut tried = Vec::with_capacity(FALLBACK_ORDER.len());
    let mut failures = Vec::with_capacity(FALLBACK_ORDER.len());

    for kind in FALLBACK_ORDER {
        tried.push(kind);
        let frame = encode(record, kind);
        match attempt(predictor, &frame) {
            Ok(price) => {
                return Ok(Reconciled {
                    price,
                    encoding: kind,
                    path: DecisionPath::Fallback,
                    attempts: tried,
                })
            }
            Err(cause) => {
                log::debug!("{kind} attempt failed: {cause}");
                failures.push(AttemptFailure { encoding: kind, cause });
            }
        }
    }

    Err(ReconError::PredictionFailure { attempts: failures })
}

/// Shape `frame` to the schema: zero-fill optional numeric columns the record
/// lacks, then reorder to the schema exactly.
fn conform(
    mut frame: EncodedFrame,
    schema: Option<&ExpectedSchema>,
    options: ReconOptions,
) -> Result<EncodedFrame, ReconError> {
    let Some(schema) = schema else {
        return Ok(frame);
    };

    let (fillable, missing): (Vec<String>, Vec<String>) = schema
        .missing_from(&frame)
        .into_iter()
        .partition(|c| OPTIONAL_NUMERIC_COLUMNS.contains(&c.as_str()));
    let unexpected = if options.strict { schema.unexpected_in(&frame) } else { Vec::new() };

    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(ReconError::SchemaMismatch { encoding: frame.kind(), missing, unexpected });
    }

    if !fillable.is_empty() {
        log::debug!("zero-filling columns absent from the record: {}", fillable.join(", "));
        frame.fill_zero(&fillable);
    }

    frame.select(schema.columns()).map_err(|missing| ReconError::SchemaMismatch {
        encoding: frame.kind(),
        missing,
        unexpected: Vec::new(),
    })
}

fn attempt<P: Predictor + ?Sized>(predictor: &P, frame: &EncodedFrame) -> Result<f64, AttemptCause> {
    let values = predictor.predict(frame).map_err(AttemptCause::Model)?;
    match values.as_slice() {
        [v] if v.is_finite() => Ok(*v),
        [v] => Err(AttemptCause::NonFinite(*v)),
        other => Err(AttemptCause::Shape { len: other.len() }),
    }
}
