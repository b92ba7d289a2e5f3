//! Fitted artifacts exported by the training pipeline.
//!
//! Three JSON files are resolved from the configured artifact directory at
//! startup: the preprocessor (scaling parameters and category vocabularies),
//! the classifier (dense feed-forward layers), and the label encoder (the
//! training-time class list). Any missing or malformed file is fatal before
//! the server starts; once loaded the artifacts are immutable.

use super::{
    FeatureTransformer, InferenceGateway, LabelDecoder, PredictError, ScoreClassifier,
    ScoreGateway,
};
use crate::score::schema::FeatureRecord;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const LABEL_ENCODER_FILE: &str = "label_encoder.json";

/// Startup artifact failures. All variants are fatal: the process must not
/// accept input without a complete artifact set.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("required artifact {} is missing; run the training export first", path.display())]
    Missing { path: PathBuf },
    #[error("failed to read artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("artifact {} is malformed: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("classifier output width {outputs} does not match the {classes} fitted classes")]
    ClassMismatch { outputs: usize, classes: usize },
}

/// Scaling and encoding parameters, in the column order the transformer was
/// fitted against. That order is owned by this file, not by the code.
#[derive(Debug, Clone, Deserialize)]
pub struct FittedPreprocessor {
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
}

#[derive(Debug, Clone, Deserialize)]
struct NumericColumn {
    column: String,
    mean: f64,
    std: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct CategoricalColumn {
    column: String,
    categories: Vec<String>,
}

impl FittedPreprocessor {
    /// Width of the transformed vector: one slot per numeric column plus one
    /// per known category.
    pub fn output_width(&self) -> usize {
        let one_hot: usize = self
            .categorical
            .iter()
            .map(|column| column.categories.len())
            .sum();
        self.numeric.len() + one_hot
    }
}

impl FeatureTransformer for FittedPreprocessor {
    fn transform(&self, record: &FeatureRecord) -> Result<Vec<f32>, PredictError> {
        let mut features = Vec::with_capacity(self.output_width());

        for numeric in &self.numeric {
            let value = record.numeric_value(&numeric.column).ok_or_else(|| {
                PredictError::UnknownColumn {
                    column: numeric.column.clone(),
                }
            })?;
            // A zero spread would divide away the feature entirely.
            let std = if numeric.std == 0.0 { 1.0 } else { numeric.std };
            features.push(((value - numeric.mean) / std) as f32);
        }

        for categorical in &self.categorical {
            let value = record.categorical_value(&categorical.column).ok_or_else(|| {
                PredictError::UnknownColumn {
                    column: categorical.column.clone(),
                }
            })?;
            for category in &categorical.categories {
                features.push(if category.as_str() == value { 1.0 } else { 0.0 });
            }
        }

        Ok(features)
    }
}

/// Dense feed-forward network exported layer by layer.
#[derive(Debug, Clone, Deserialize)]
pub struct FittedClassifier {
    layers: Vec<DenseLayer>,
}

impl FittedClassifier {
    /// Number of label indices the final layer emits.
    pub fn output_classes(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.bias.len())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DenseLayer {
    /// Row-major: `weights[output][input]`.
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    activation: Activation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Activation {
    Linear,
    Relu,
    Softmax,
}

impl DenseLayer {
    fn forward(&self, input: &[f32]) -> Result<Vec<f32>, PredictError> {
        let mut output = Vec::with_capacity(self.weights.len());
        for (row, bias) in self.weights.iter().zip(&self.bias) {
            if row.len() != input.len() {
                return Err(PredictError::DimensionMismatch {
                    expected: row.len(),
                    actual: input.len(),
                });
            }
            let sum: f32 = row.iter().zip(input).map(|(w, x)| w * x).sum();
            output.push(sum + bias);
        }
        self.activation.apply(&mut output);
        Ok(output)
    }
}

impl Activation {
    fn apply(self, values: &mut [f32]) {
        match self {
            Activation::Linear => {}
            Activation::Relu => {
                for value in values.iter_mut() {
                    *value = value.max(0.0);
                }
            }
            Activation::Softmax => {
                let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                let mut sum = 0.0;
                for value in values.iter_mut() {
                    *value = (*value - max).exp();
                    sum += *value;
                }
                for value in values.iter_mut() {
                    *value /= sum;
                }
            }
        }
    }
}

impl ScoreClassifier for FittedClassifier {
    fn classify(&self, features: &[f32]) -> Result<Vec<f32>, PredictError> {
        let mut activations = features.to_vec();
        for layer in &self.layers {
            activations = layer.forward(&activations)?;
        }
        Ok(activations)
    }
}

/// Training-time class list. Index order is exactly the order the classifier
/// was fitted with.
#[derive(Debug, Clone, Deserialize)]
pub struct FittedLabelEncoder {
    classes: Vec<String>,
}

impl FittedLabelEncoder {
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl LabelDecoder for FittedLabelEncoder {
    fn decode(&self, index: usize) -> Result<String, PredictError> {
        self.classes
            .get(index)
            .cloned()
            .ok_or(PredictError::UnknownLabelIndex {
                index,
                classes: self.classes.len(),
            })
    }
}

/// The complete artifact set, loaded once and shared read-only for the life
/// of the process.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub preprocessor: FittedPreprocessor,
    pub classifier: FittedClassifier,
    pub label_encoder: FittedLabelEncoder,
}

impl ModelArtifacts {
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let preprocessor: FittedPreprocessor = load_artifact(&dir.join(PREPROCESSOR_FILE))?;
        let classifier: FittedClassifier = load_artifact(&dir.join(CLASSIFIER_FILE))?;
        let label_encoder: FittedLabelEncoder = load_artifact(&dir.join(LABEL_ENCODER_FILE))?;

        let outputs = classifier.output_classes();
        let classes = label_encoder.classes().len();
        if outputs != classes {
            return Err(ArtifactError::ClassMismatch { outputs, classes });
        }

        info!(
            dir = %dir.display(),
            features = preprocessor.output_width(),
            classes,
            "fitted artifacts loaded"
        );

        Ok(Self {
            preprocessor,
            classifier,
            label_encoder,
        })
    }

    /// Assemble the immutable gateway the presentation layer holds.
    pub fn into_gateway(self) -> Arc<dyn ScoreGateway> {
        Arc::new(InferenceGateway::new(
            self.preprocessor,
            self.classifier,
            self.label_encoder,
        ))
    }
}

fn load_artifact<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing {
            path: path.to_path_buf(),
        });
    }
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::schema::{midrange_profile_for_tests, FeatureRecord};
    use serde_json::json;

    fn record() -> FeatureRecord {
        FeatureRecord::assemble(midrange_profile_for_tests(), 183)
    }

    fn tiny_preprocessor() -> FittedPreprocessor {
        serde_json::from_value(json!({
            "numeric": [
                { "column": "Annual_Income", "mean": 50000.0, "std": 2000.0 },
                { "column": "Credit_History_Age_Months", "mean": 183.0, "std": 60.0 }
            ],
            "categorical": [
                { "column": "Credit_Mix", "categories": ["Bad", "Good", "Standard"] }
            ]
        }))
        .expect("preprocessor json parses")
    }

    #[test]
    fn transform_scales_numerics_then_one_hot_encodes() {
        let transformed = tiny_preprocessor()
            .transform(&record())
            .expect("transform succeeds");
        // (52000 - 50000) / 2000 = 1.0, (183 - 183) / 60 = 0.0, Credit_Mix=Good
        assert_eq!(transformed, vec![1.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn transform_output_matches_declared_width() {
        let preprocessor = tiny_preprocessor();
        let transformed = preprocessor.transform(&record()).expect("transform succeeds");
        assert_eq!(transformed.len(), preprocessor.output_width());
    }

    #[test]
    fn unknown_fitted_column_is_a_predict_error() {
        let preprocessor: FittedPreprocessor = serde_json::from_value(json!({
            "numeric": [{ "column": "Not_A_Column", "mean": 0.0, "std": 1.0 }],
            "categorical": []
        }))
        .expect("preprocessor json parses");
        let err = preprocessor.transform(&record()).expect_err("must fail");
        assert_eq!(
            err,
            PredictError::UnknownColumn {
                column: "Not_A_Column".to_string()
            }
        );
    }

    #[test]
    fn zero_spread_columns_do_not_divide_by_zero() {
        let preprocessor: FittedPreprocessor = serde_json::from_value(json!({
            "numeric": [{ "column": "Annual_Income", "mean": 2000.0, "std": 0.0 }],
            "categorical": []
        }))
        .expect("preprocessor json parses");
        let transformed = preprocessor.transform(&record()).expect("transform succeeds");
        assert_eq!(transformed, vec![50000.0]);
    }

    #[test]
    fn classifier_runs_layers_in_order_with_activations() {
        let classifier: FittedClassifier = serde_json::from_value(json!({
            "layers": [
                {
                    "weights": [[1.0, 0.0], [0.0, -1.0]],
                    "bias": [0.0, 0.0],
                    "activation": "relu"
                },
                {
                    "weights": [[1.0, 0.0], [0.0, 1.0]],
                    "bias": [0.0, 0.0],
                    "activation": "softmax"
                }
            ]
        }))
        .expect("classifier json parses");

        // relu(1*2, -1*3) = [2, 0]; softmax keeps the first index dominant.
        let distribution = classifier.classify(&[2.0, 3.0]).expect("classify succeeds");
        assert_eq!(distribution.len(), 2);
        assert!(distribution[0] > distribution[1]);
        let total: f32 = distribution.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let classifier: FittedClassifier = serde_json::from_value(json!({
            "layers": [
                { "weights": [[1.0, 1.0]], "bias": [0.0], "activation": "linear" }
            ]
        }))
        .expect("classifier json parses");
        let err = classifier.classify(&[1.0]).expect_err("must fail");
        assert_eq!(
            err,
            PredictError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn label_encoder_decodes_in_fitted_order() {
        let encoder: FittedLabelEncoder =
            serde_json::from_value(json!({ "classes": ["Good", "Poor", "Standard"] }))
                .expect("label encoder json parses");
        assert_eq!(encoder.decode(0).expect("index 0"), "Good");
        assert_eq!(encoder.decode(2).expect("index 2"), "Standard");
        assert!(matches!(
            encoder.decode(3),
            Err(PredictError::UnknownLabelIndex {
                index: 3,
                classes: 3
            })
        ));
    }
}
