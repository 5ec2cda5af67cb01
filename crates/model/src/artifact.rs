use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use griya_recon::{EncodedFrame, EncodingKind, ExpectedSchema, PredictError, Predictor};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::LoadError;
use crate::linear::{LinearPipeline, UnknownCategory};

pub const ARTIFACT_FORMAT: &str = "griya-linear";
pub const ARTIFACT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// On-disk shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub format: String,
    pub version: u32,
    /// Encoding the training run used. Absent in legacy artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<EncodingKind>,
    /// Columns the model was fit on, in fit order. Not every model records them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<ExpectedSchema>,
    pub intercept: f64,
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub categories: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub unknown_category: UnknownCategory,
}

impl ArtifactFile {
    fn validate(&self) -> Result<(), LoadError> {
        if self.format != ARTIFACT_FORMAT {
            return Err(LoadError::Invalid(format!(
                "unsupported format \"{}\" (expected \"{ARTIFACT_FORMAT}\")",
                self.format
            )));
        }
        if self.version != ARTIFACT_VERSION {
            return Err(LoadError::Invalid(format!(
                "unsupported version {} (expected {ARTIFACT_VERSION})",
                self.version
            )));
        }
        if self.weights.is_empty() && self.categories.is_empty() {
            return Err(LoadError::Invalid("artifact has no weights".into()));
        }
        if !self.intercept.is_finite() {
            return Err(LoadError::Invalid("intercept is not finite".into()));
        }
        if let Some((column, _)) = self.weights.iter().find(|(_, w)| !w.is_finite()) {
            return Err(LoadError::Invalid(format!("weight for '{column}' is not finite")));
        }
        if let Some(column) = self.categories.keys().find(|c| self.weights.contains_key(*c)) {
            return Err(LoadError::Invalid(format!(
                "column '{column}' is both numeric and categorical"
            )));
        }

        if let Some(ref names) = self.feature_names {
            let mut seen = HashSet::new();
            if let Some(dup) = names.columns().iter().find(|c| !seen.insert(c.as_str())) {
                return Err(LoadError::Invalid(format!("feature name '{dup}' repeated")));
            }
            let uncovered: Vec<&str> = self
                .weights
                .keys()
                .chain(self.categories.keys())
                .filter(|c| !names.contains(c))
                .map(String::as_str)
                .collect();
            if !uncovered.is_empty() {
                return Err(LoadError::Invalid(format!(
                    "columns [{}] are weighted but not listed in feature_names",
                    uncovered.join(", ")
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loaded model
// ---------------------------------------------------------------------------

/// A validated artifact, ready to predict. Immutable after load.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pipeline: LinearPipeline,
    encoding: Option<EncodingKind>,
    fingerprint: String,
    source: Option<PathBuf>,
}

impl LoadedModel {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        let file: ArtifactFile =
            serde_json::from_slice(bytes).map_err(|e| LoadError::Parse(e.to_string()))?;
        file.validate()?;

        Ok(Self {
            pipeline: LinearPipeline {
                intercept: file.intercept,
                weights: file.weights,
                categories: file.categories,
                unknown_category: file.unknown_category,
                feature_names: file.feature_names,
            },
            encoding: file.encoding,
            fingerprint: fingerprint(bytes),
            source: None,
        })
    }

    /// `sha256:<hex>` of the artifact bytes.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl Predictor for LoadedModel {
    fn predict(&self, frame: &EncodedFrame) -> Result<Vec<f64>, PredictError> {
        self.pipeline.predict(frame)
    }

    fn expected_schema(&self) -> Option<&ExpectedSchema> {
        self.pipeline.feature_names.as_ref()
    }

    fn declared_encoding(&self) -> Option<EncodingKind> {
        self.encoding
    }
}

fn fingerprint(bytes: &[u8]) -> String {
    format!("sha256:{:x}", Sha256::digest(bytes))
}

/// Read and validate the artifact at `path`.
pub fn load(path: &Path) -> Result<LoadedModel, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut model = LoadedModel::from_slice(&bytes)?;
    model.source = Some(path.to_path_buf());

    log::info!(
        "loaded model {} ({}, schema: {}, encoding tag: {})",
        path.display(),
        model.fingerprint,
        model
            .expected_schema()
            .map(|s| format!("{} columns", s.len()))
            .unwrap_or_else(|| "none".into()),
        model.encoding.map(|e| e.to_string()).unwrap_or_else(|| "none".into()),
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "format": "griya-linear",
        "version": 1,
        "intercept": 5.0,
        "weights": { "bedrooms": 2.0 }
    }"#;

    #[test]
    fn minimal_artifact_loads_without_metadata() {
        let model = LoadedModel::from_slice(MINIMAL.as_bytes()).unwrap();
        assert!(model.expected_schema().is_none());
        assert!(model.declared_encoding().is_none());
        assert!(model.fingerprint().starts_with("sha256:"));
        assert_eq!(model.fingerprint().len(), "sha256:".len() + 64);
    }

    #[test]
    fn fingerprint_tracks_bytes() {
        let a = LoadedModel::from_slice(MINIMAL.as_bytes()).unwrap();
        let b = LoadedModel::from_slice(MINIMAL.replace("5.0", "6.0").as_bytes()).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn rejects_foreign_format() {
        let err = LoadedModel::from_slice(MINIMAL.replace("griya-linear", "pickle").as_bytes())
            .unwrap_err();
        assert!(matches!(err, LoadError::Invalid(_)));
        assert!(err.to_string().contains("unsupported format"));
    }

    #[test]
    fn rejects_future_version() {
        let err = LoadedModel::from_slice(MINIMAL.replace("\"version\": 1", "\"version\": 2").as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("unsupported version 2"));
    }

    #[test]
    fn rejects_garbage() {
        let err = LoadedModel::from_slice(b"\x80\x04\x95pickle").unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn feature_names_must_cover_weights() {
        let json = r#"{
            "format": "griya-linear", "version": 1, "intercept": 0.0,
            "feature_names": ["bedrooms"],
            "weights": { "bedrooms": 1.0, "floors": 1.0 }
        }"#;
        let err = LoadedModel::from_slice(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("[floors]"), "{err}");
    }

    #[test]
    fn repeated_feature_name_rejected() {
        let json = r#"{
            "format": "griya-linear", "version": 1, "intercept": 0.0,
            "feature_names": ["bedrooms", "bedrooms"],
            "weights": { "bedrooms": 1.0 }
        }"#;
        assert!(LoadedModel::from_slice(json.as_bytes()).is_err());
    }

    #[test]
    fn column_cannot_be_numeric_and_categorical() {
        let json = r#"{
            "format": "griya-linear", "version": 1, "intercept": 0.0,
            "weights": { "city": 1.0 },
            "categories": { "city": { "Bogor": 1.0 } }
        }"#;
        let err = LoadedModel::from_slice(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("both numeric and categorical"));
    }

    #[test]
    fn encoding_tag_is_exposed() {
        let json = MINIMAL.replace("\"version\": 1,", "\"version\": 1, \"encoding\": \"one_hot\",");
        let model = LoadedModel::from_slice(json.as_bytes()).unwrap();
        assert_eq!(model.declared_encoding(), Some(EncodingKind::OneHot));
    }
}
