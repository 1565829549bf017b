//! Gradient-boosted tree classifier read from XGBoost's native JSON model
//! format (`Booster.save_model("model.json")`).
//!
//! Only the parts needed for binary probability inference are read:
//! the tree arrays, the base score, the objective name and the optional
//! `best_iteration` attribute. Evaluation mirrors XGBoost: features are
//! compared as `f32`, a split goes left when `value < threshold`, missing
//! (NaN) values follow `default_left`, and the summed margin is passed
//! through the logistic function.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use super::{Classifier, InferenceError, ModelInfo, ModelLoadError};

// ── On-disk layout ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawModel {
    learner: RawLearner,
}

#[derive(Deserialize)]
struct RawLearner {
    #[serde(default)]
    attributes: HashMap<String, Value>,
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: RawBooster,
    learner_model_param: RawLearnerParam,
    objective: RawObjective,
}

#[derive(Deserialize)]
struct RawBooster {
    name: String,
    #[serde(default)]
    model: Option<RawTrees>,
}

#[derive(Deserialize)]
struct RawTrees {
    #[serde(default)]
    gbtree_model_param: Option<RawGbtreeParam>,
    trees: Vec<RawTree>,
}

#[derive(Deserialize)]
struct RawGbtreeParam {
    #[serde(default)]
    num_parallel_tree: Option<Value>,
}

#[derive(Deserialize)]
struct RawLearnerParam {
    base_score: Value,
    #[serde(default)]
    num_class: Option<Value>,
    num_feature: Value,
    #[serde(default)]
    num_target: Option<Value>,
}

#[derive(Deserialize)]
struct RawObjective {
    name: String,
}

#[derive(Deserialize)]
struct RawTree {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    default_left: Vec<Value>,
    /// 0 = numerical, 1 = categorical
    #[serde(default)]
    split_type: Vec<i64>,
    #[serde(default)]
    tree_param: Option<RawTreeParam>,
}

#[derive(Deserialize)]
struct RawTreeParam {
    #[serde(default)]
    size_leaf_vector: Option<Value>,
}

// ── In-memory representation ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f32,
        default_left: bool,
        left: usize,
        right: usize,
    },
    Leaf(f32),
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Walk from the root to a leaf. Children always sit after their parent
    /// (checked at load), so the walk terminates.
    fn leaf_value(&self, row: &[f32]) -> f32 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf(v) => return *v,
                Node::Split {
                    feature,
                    threshold,
                    default_left,
                    left,
                    right,
                } => {
                    let value = row[*feature];
                    let go_left = if value.is_nan() {
                        *default_left
                    } else {
                        value < *threshold
                    };
                    idx = if go_left { *left } else { *right };
                }
            }
        }
    }
}

/// Binary `binary:logistic` / `reg:logistic` tree ensemble.
#[derive(Debug, Clone)]
pub struct XGBoostClassifier {
    trees: Vec<Tree>,
    base_margin: f32,
    num_features: usize,
    feature_names: Vec<String>,
}

impl XGBoostClassifier {
    /// Read and validate an artifact. `expected_features` is the width of the
    /// vectors this model will be fed.
    pub fn load(path: &Path, expected_features: usize) -> Result<Self, ModelLoadError> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ModelLoadError::Missing {
                    path: path.to_path_buf(),
                }
            } else {
                ModelLoadError::Unreadable {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::parse(path, &bytes, expected_features)
    }

    /// Parse artifact bytes. `path` is used for error messages only.
    pub fn parse(
        path: &Path,
        bytes: &[u8],
        expected_features: usize,
    ) -> Result<Self, ModelLoadError> {
        let corrupt = |reason: String| ModelLoadError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };
        let unsupported = |reason: String| ModelLoadError::Unsupported {
            path: path.to_path_buf(),
            reason,
        };

        let raw: RawModel =
            serde_json::from_slice(bytes).map_err(|e| corrupt(format!("invalid model JSON: {}", e)))?;
        let learner = raw.learner;

        let objective = learner.objective.name.as_str();
        if objective != "binary:logistic" && objective != "reg:logistic" {
            return Err(unsupported(format!("objective '{}' is not a binary probability objective", objective)));
        }

        let num_class = learner
            .learner_model_param
            .num_class
            .as_ref()
            .map(|v| param_usize(v).ok_or_else(|| corrupt("num_class is not an integer".into())))
            .transpose()?
            .unwrap_or(0);
        if num_class > 1 {
            return Err(unsupported(format!("multi-class model ({} classes)", num_class)));
        }

        let num_target = learner
            .learner_model_param
            .num_target
            .as_ref()
            .map(|v| param_usize(v).ok_or_else(|| corrupt("num_target is not an integer".into())))
            .transpose()?
            .unwrap_or(1);
        if num_target > 1 {
            return Err(unsupported(format!("multi-target model ({} targets)", num_target)));
        }

        let num_features = param_usize(&learner.learner_model_param.num_feature)
            .ok_or_else(|| corrupt("num_feature is not an integer".into()))?;
        if num_features != expected_features {
            return Err(unsupported(format!(
                "model has {} features, expected {}",
                num_features, expected_features
            )));
        }

        let base_score = parse_base_score(&learner.learner_model_param.base_score)
            .ok_or_else(|| corrupt("base_score is not a number".into()))?;

        if learner.gradient_booster.name != "gbtree" {
            return Err(unsupported(format!(
                "booster '{}' is not supported (gbtree only)",
                learner.gradient_booster.name
            )));
        }
        let raw_trees = learner
            .gradient_booster
            .model
            .ok_or_else(|| corrupt("gbtree booster has no model".into()))?;

        let trees_per_round = raw_trees
            .gbtree_model_param
            .as_ref()
            .and_then(|p| p.num_parallel_tree.as_ref())
            .and_then(param_usize)
            .unwrap_or(1)
            .max(1);

        for (i, t) in raw_trees.trees.iter().enumerate() {
            if t.split_type.iter().any(|&st| st != 0) {
                return Err(unsupported(format!("tree {} uses categorical splits", i)));
            }
            let leaf_width = t
                .tree_param
                .as_ref()
                .and_then(|p| p.size_leaf_vector.as_ref())
                .and_then(param_usize)
                .unwrap_or(1);
            if leaf_width > 1 {
                return Err(unsupported(format!("tree {} has vector leaves (size {})", i, leaf_width)));
            }
        }

        let mut trees = raw_trees
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| convert_tree(t, num_features).map_err(|r| corrupt(format!("tree {}: {}", i, r))))
            .collect::<Result<Vec<_>, _>>()?;
        if trees.is_empty() {
            return Err(corrupt("model contains no trees".into()));
        }

        // Early-stopped models predict with the rounds up to best_iteration.
        if let Some(best) = learner.attributes.get("best_iteration").and_then(param_usize) {
            let keep = (best + 1) * trees_per_round;
            trees.truncate(keep.max(trees_per_round));
        }

        Ok(XGBoostClassifier {
            trees,
            base_margin: prob_to_margin(base_score),
            num_features,
            feature_names: learner.feature_names,
        })
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for XGBoostClassifier {
    fn predict_probability(&self, features: &[f64]) -> Result<f64, InferenceError> {
        if features.len() != self.num_features {
            return Err(InferenceError::FeatureShape {
                expected: self.num_features,
                got: features.len(),
            });
        }
        let row: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let margin = self
            .trees
            .iter()
            .fold(self.base_margin, |acc, t| acc + t.leaf_value(&row));
        let p = sigmoid(margin) as f64;
        if !p.is_finite() {
            return Err(InferenceError::NonFinite);
        }
        Ok(p)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            kind: "xgboost-gbtree".to_string(),
            num_features: self.num_features,
            num_trees: self.num_trees(),
            feature_names: self.feature_names.clone(),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn convert_tree(raw: RawTree, num_features: usize) -> Result<Tree, String> {
    let n = raw.left_children.len();
    if n == 0 {
        return Err("empty tree".into());
    }
    if raw.right_children.len() != n
        || raw.split_indices.len() != n
        || raw.split_conditions.len() != n
        || raw.default_left.len() != n
    {
        return Err(format!("node arrays disagree in length (expected {})", n));
    }

    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
        let left = raw.left_children[i];
        if left == -1 {
            // Leaf values live in split_conditions.
            nodes.push(Node::Leaf(raw.split_conditions[i]));
            continue;
        }
        let right = raw.right_children[i];
        let child_ok = |c: i32| c > i as i32 && (c as usize) < n;
        if !child_ok(left) || !child_ok(right) {
            return Err(format!("node {} has invalid children ({}, {})", i, left, right));
        }
        let feature = raw.split_indices[i];
        if feature < 0 || feature as usize >= num_features {
            return Err(format!("node {} splits on unknown feature {}", i, feature));
        }
        let default_left = flag(&raw.default_left[i])
            .ok_or_else(|| format!("node {} has a non-boolean default_left", i))?;
        nodes.push(Node::Split {
            feature: feature as usize,
            threshold: raw.split_conditions[i],
            default_left,
            left: left as usize,
            right: right as usize,
        });
    }
    Ok(Tree { nodes })
}

/// XGBoost writes most scalar params as strings ("4"), some as numbers.
fn param_usize(v: &Value) -> Option<usize> {
    match v {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// base_score appears as 0.5, "5E-1", "[5E-1]" or [0.5] depending on version.
fn parse_base_score(v: &Value) -> Option<f32> {
    match v {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => {
            let t = s.trim();
            let inner = t
                .strip_prefix('[')
                .and_then(|x| x.strip_suffix(']'))
                .unwrap_or(t);
            inner.split(',').next()?.trim().parse().ok()
        }
        Value::Array(items) => items.first().and_then(parse_base_score),
        _ => None,
    }
}

fn flag(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    }
}

fn prob_to_margin(p: f32) -> f32 {
    let p = p.clamp(1e-7, 1.0 - 1e-7);
    (p / (1.0 - p)).ln()
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
