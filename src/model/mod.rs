pub mod xgboost;

pub use xgboost::XGBoostClassifier;

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// A trained binary classifier that maps a feature vector to P(class = 1).
pub trait Classifier: Send + Sync {
    fn predict_probability(&self, features: &[f64]) -> Result<f64, InferenceError>;

    /// Summary for logging and the health endpoint.
    fn info(&self) -> ModelInfo;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub kind: String,
    pub num_features: usize,
    pub num_trees: usize,
    pub feature_names: Vec<String>,
}

/// Failure to bring a model artifact into memory. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("model artifact not found: {path}")]
    Missing { path: PathBuf },
    #[error("failed to read model artifact {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt model artifact {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("unsupported model artifact {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },
}

/// Failure while evaluating a loaded model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("feature vector has {got} values, model expects {expected}")]
    FeatureShape { expected: usize, got: usize },
    #[error("model produced a non-finite probability")]
    NonFinite,
}

/// Both classifiers, loaded once and shared read-only for the process lifetime.
#[derive(Clone)]
pub struct ModelStore {
    pub pre_match: Arc<dyn Classifier>,
    pub live: Arc<dyn Classifier>,
}

impl ModelStore {
    pub fn new(pre_match: Arc<dyn Classifier>, live: Arc<dyn Classifier>) -> Self {
        ModelStore { pre_match, live }
    }

    /// Load both artifacts. Either one failing fails the whole store.
    pub fn load(
        pre_match_path: &Path,
        live_path: &Path,
        num_features: usize,
    ) -> Result<Self, ModelLoadError> {
        let pre_match = XGBoostClassifier::load(pre_match_path, num_features)?;
        log_loaded("pre-match", pre_match_path, &pre_match.info());
        let live = XGBoostClassifier::load(live_path, num_features)?;
        log_loaded("live WPA", live_path, &live.info());
        Ok(ModelStore::new(Arc::new(pre_match), Arc::new(live)))
    }
}

fn log_loaded(label: &str, path: &Path, info: &ModelInfo) {
    info!(
        "Loaded {} model from {} ({} trees, {} features{})",
        label,
        path.display(),
        info.num_trees,
        info.num_features,
        if info.feature_names.is_empty() {
            String::new()
        } else {
            format!(": {}", info.feature_names.join(", "))
        }
    );
}
