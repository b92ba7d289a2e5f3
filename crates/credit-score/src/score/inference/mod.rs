//! The inference gateway: transform, classify, decode.
//!
//! The three fitted artifacts are opaque collaborators behind trait seams so
//! the HTTP layer and the tests can substitute deterministic stubs.

pub mod artifacts;

use crate::score::schema::FeatureRecord;
use crate::score::{Prediction, Severity};
use thiserror::Error;
use tracing::debug;

/// A malformed record or artifact reaching the gateway. Given the assembly
/// contract this is a programming error, not user input; it fails the one
/// request it occurred in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    #[error("feature column '{column}' is not part of the record schema")]
    UnknownColumn { column: String },
    #[error("classifier layer expected {expected} inputs, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("classifier produced an empty distribution")]
    EmptyDistribution,
    #[error("label index {index} is outside the fitted class list of {classes}")]
    UnknownLabelIndex { index: usize, classes: usize },
}

/// Encodes categoricals and scales numerics exactly as fitted at training
/// time. The transformation itself is opaque to callers.
pub trait FeatureTransformer: Send + Sync {
    fn transform(&self, record: &FeatureRecord) -> Result<Vec<f32>, PredictError>;
}

/// Produces a probability distribution over label indices.
pub trait ScoreClassifier: Send + Sync {
    fn classify(&self, features: &[f32]) -> Result<Vec<f32>, PredictError>;
}

/// Maps a label index back to the human-readable category string. Label
/// order is training-time state carried by the artifact, never hardcoded.
pub trait LabelDecoder: Send + Sync {
    fn decode(&self, index: usize) -> Result<String, PredictError>;
}

/// Object-safe seam the presentation layer holds (`Arc<dyn ScoreGateway>`).
pub trait ScoreGateway: Send + Sync {
    fn predict(&self, record: &FeatureRecord) -> Result<Prediction, PredictError>;
}

/// Composes the three fitted steps sequentially. Construction is explicit:
/// the artifacts are loaded once at startup and injected here, there is no
/// process-global model state.
pub struct InferenceGateway<T, C, D> {
    transformer: T,
    classifier: C,
    decoder: D,
}

impl<T, C, D> InferenceGateway<T, C, D>
where
    T: FeatureTransformer,
    C: ScoreClassifier,
    D: LabelDecoder,
{
    pub fn new(transformer: T, classifier: C, decoder: D) -> Self {
        Self {
            transformer,
            classifier,
            decoder,
        }
    }
}

impl<T, C, D> ScoreGateway for InferenceGateway<T, C, D>
where
    T: FeatureTransformer,
    C: ScoreClassifier,
    D: LabelDecoder,
{
    fn predict(&self, record: &FeatureRecord) -> Result<Prediction, PredictError> {
        let features = self.transformer.transform(record)?;
        let distribution = self.classifier.classify(&features)?;
        let index = argmax(&distribution).ok_or(PredictError::EmptyDistribution)?;
        let label = self.decoder.decode(index)?;
        debug!(%label, index, "submission classified");

        Ok(Prediction {
            severity: Severity::for_label(&label),
            label,
        })
    }
}

/// Index of the maximum value; ties resolve to the lowest index.
fn argmax(distribution: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &value) in distribution.iter().enumerate() {
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}
