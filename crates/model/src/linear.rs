use std::collections::BTreeMap;

use griya_recon::{EncodedFrame, ExpectedSchema, PredictError};
use serde::{Deserialize, Serialize};

/// What to do with a categorical value the pipeline never saw during fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategory {
    #[default]
    Error,
    /// Contribute nothing, as an all-zero indicator row would.
    Ignore,
}

/// Fitted linear regression with an optional built-in categorical encoder.
///
/// `weights` are applied to numeric columns (including one-hot indicators);
/// `categories` map a text column's label to its learned contribution.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearPipeline {
    pub intercept: f64,
    pub weights: BTreeMap<String, f64>,
    pub categories: BTreeMap<String, BTreeMap<String, f64>>,
    pub unknown_category: UnknownCategory,
    /// When present, input columns must match these names in this order.
    pub feature_names: Option<ExpectedSchema>,
}

impl LinearPipeline {
    pub fn predict(&self, frame: &EncodedFrame) -> Result<Vec<f64>, PredictError> {
        if let Some(ref names) = self.feature_names {
            check_feature_names(names, frame)?;
        }

        let mut total = self.intercept;

        for (column, weight) in &self.weights {
            let value = frame
                .get(column)
                .ok_or_else(|| PredictError::new(format!("column '{column}' is missing from the input")))?;
            let x = value.as_f64().ok_or_else(|| {
                PredictError::new(format!("could not convert string to float: '{value}' (column '{column}')"))
            })?;
            total += weight * x;
        }

        for (column, table) in &self.categories {
            let value = frame
                .get(column)
                .ok_or_else(|| PredictError::new(format!("column '{column}' is missing from the input")))?;
            let label = value.as_text().ok_or_else(|| {
                PredictError::new(format!("column '{column}' expects a category label, got {value}"))
            })?;
            match (table.get(label), self.unknown_category) {
                (Some(contribution), _) => total += contribution,
                (None, UnknownCategory::Ignore) => {}
                (None, UnknownCategory::Error) => {
                    return Err(PredictError::new(format!(
                        "found unknown category '{label}' in column '{column}' during transform"
                    )))
                }
            }
        }

        Ok(vec![total])
    }
}

/// Names and order must match the fit exactly.
fn check_feature_names(names: &ExpectedSchema, frame: &EncodedFrame) -> Result<(), PredictError> {
    let missing = names.missing_from(frame);
    let unexpected = names.unexpected_in(frame);

    if missing.is_empty() && unexpected.is_empty() {
        if frame.column_names().eq(names.columns().iter().map(String::as_str)) {
            return Ok(());
        }
        return Err(PredictError::new(
            "feature names must be in the same order as they were in fit",
        ));
    }

    let mut parts = Vec::new();
    if !unexpected.is_empty() {
        parts.push(format!("feature names unseen at fit time: [{}]", unexpected.join(", ")));
    }
    if !missing.is_empty() {
        parts.push(format!("feature names seen at fit time, yet now missing: [{}]", missing.join(", ")));
    }
    Err(PredictError::new(format!(
        "the feature names should match those that were passed during fit; {}",
        parts.join("; ")
    )))
}
