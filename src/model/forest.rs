//! Random forest regressor read from a JSON export of scikit-learn trees.
//!
//! Each tree is stored the way scikit-learn keeps it internally: parallel
//! per-node arrays, with `children_left[i] == -1` marking a leaf.
//!
//! ```text
//! {
//!   "n_features": 10,
//!   "feature_names": ["start_station_id", ...],   // optional
//!   "trees": [
//!     { "children_left":  [1, -1, -1],
//!       "children_right": [2, -1, -1],
//!       "feature":        [1, -2, -2],
//!       "threshold":      [7.5, -2.0, -2.0],
//!       "value":          [3.1, 1.0, 5.0] }
//!   ]
//! }
//! ```

use serde::Deserialize;

use super::{check_len, Predictor};
use crate::error::{LoadError, PredictError};

const LEAF: i64 = -1;

#[derive(Debug, Clone, Deserialize)]
pub struct TreeArrays {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForestArtifact {
    pub n_features: usize,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub trees: Vec<TreeArrays>,
}

/// One validated tree. Child indices always point forward, so traversal terminates.
#[derive(Debug, Clone)]
struct Tree {
    left: Box<[u32]>,
    right: Box<[u32]>,
    feature: Box<[u32]>,
    threshold: Box<[f64]>,
    is_leaf: Box<[bool]>,
    value: Box<[f64]>,
}

impl Tree {
    fn from_arrays(t: TreeArrays, n_features: usize, tree_idx: usize) -> Result<Self, LoadError> {
        let n = t.children_left.len();
        let invalid = |msg: String| LoadError::InvalidModel(format!("tree {tree_idx}: {msg}"));

        if n == 0 {
            return Err(invalid("no nodes".into()));
        }
        for (name, len) in [
            ("children_right", t.children_right.len()),
            ("feature", t.feature.len()),
            ("threshold", t.threshold.len()),
            ("value", t.value.len()),
        ] {
            if len != n {
                return Err(invalid(format!("{name} has {len} entries, expected {n}")));
            }
        }

        let mut left = Vec::with_capacity(n);
        let mut right = Vec::with_capacity(n);
        let mut feature = Vec::with_capacity(n);
        let mut is_leaf = Vec::with_capacity(n);

        for i in 0..n {
            let (l, r) = (t.children_left[i], t.children_right[i]);
            if l == LEAF {
                if r != LEAF {
                    return Err(invalid(format!("node {i} has only a right child")));
                }
                if !t.value[i].is_finite() {
                    return Err(invalid(format!("leaf {i} has non-finite value")));
                }
                left.push(0);
                right.push(0);
                feature.push(0);
                is_leaf.push(true);
                continue;
            }

            for child in [l, r] {
                if child <= i as i64 || child >= n as i64 {
                    return Err(invalid(format!("node {i} has out-of-order child {child}")));
                }
            }
            let f = t.feature[i];
            if f < 0 || f as usize >= n_features {
                return Err(invalid(format!(
                    "node {i} splits on feature {f}, model has {n_features}"
                )));
            }
            if t.threshold[i].is_nan() {
                return Err(invalid(format!("node {i} has NaN threshold")));
            }
            left.push(l as u32);
            right.push(r as u32);
            feature.push(f as u32);
            is_leaf.push(false);
        }

        Ok(Self {
            left: left.into_boxed_slice(),
            right: right.into_boxed_slice(),
            feature: feature.into_boxed_slice(),
            threshold: t.threshold.into_boxed_slice(),
            is_leaf: is_leaf.into_boxed_slice(),
            value: t.value.into_boxed_slice(),
        })
    }

    fn predict_row(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        while !self.is_leaf[idx] {
            // scikit-learn casts inputs to float32 before comparing.
            let x = features[self.feature[idx] as usize] as f32 as f64;
            idx = if x <= self.threshold[idx] {
                self.left[idx] as usize
            } else {
                self.right[idx] as usize
            };
        }
        self.value[idx]
    }
}

#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    n_features: usize,
    feature_names: Option<Vec<String>>,
    trees: Vec<Tree>,
}

impl RandomForestRegressor {
    pub fn from_artifact(artifact: ForestArtifact) -> Result<Self, LoadError> {
        if artifact.trees.is_empty() {
            return Err(LoadError::InvalidModel("forest has no trees".into()));
        }
        if artifact.n_features == 0 {
            return Err(LoadError::InvalidModel("n_features must be positive".into()));
        }
        if let Some(names) = &artifact.feature_names {
            if names.len() != artifact.n_features {
                return Err(LoadError::InvalidModel(format!(
                    "feature_names lists {} columns, n_features is {}",
                    names.len(),
                    artifact.n_features
                )));
            }
        }

        let n_features = artifact.n_features;
        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| Tree::from_arrays(t, n_features, i))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            n_features,
            feature_names: artifact.feature_names,
            trees,
        })
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        let artifact: ForestArtifact = serde_json::from_slice(bytes)?;
        Self::from_artifact(artifact)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Predictor for RandomForestRegressor {
    fn predict(&self, features: &[f64]) -> Result<f64, PredictError> {
        check_len(features, self.n_features)?;
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(features)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn kind(&self) -> &'static str {
        "random_forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // x0 <= 7.5 ? 1.0 : 5.0
    fn stump(threshold: f64, lo: f64, hi: f64) -> serde_json::Value {
        json!({
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [0, -2, -2],
            "threshold": [threshold, -2.0, -2.0],
            "value": [0.0, lo, hi]
        })
    }

    fn forest(trees: Vec<serde_json::Value>, n_features: usize) -> Result<RandomForestRegressor, LoadError> {
        let doc = json!({ "n_features": n_features, "trees": trees });
        RandomForestRegressor::from_json_slice(doc.to_string().as_bytes())
    }

    #[test]
    fn averages_leaf_values_across_trees() {
        let rf = forest(vec![stump(7.5, 1.0, 5.0), stump(10.0, 2.0, 4.0)], 2).unwrap();
        assert_eq!(rf.n_trees(), 2);
        assert_eq!(rf.predict(&[8.0, 0.0]).unwrap(), (5.0 + 2.0) / 2.0);
        assert_eq!(rf.predict(&[11.0, 0.0]).unwrap(), (5.0 + 4.0) / 2.0);
    }

    #[test]
    fn threshold_equality_goes_left() {
        let rf = forest(vec![stump(7.5, 1.0, 5.0)], 1).unwrap();
        assert_eq!(rf.predict(&[7.5]).unwrap(), 1.0);
    }

    #[test]
    fn deeper_tree_follows_both_features() {
        // root: x1 <= 0.5 -> node1 (x0 <= 3 ? 10 : 20), else leaf 30
        let tree = json!({
            "children_left":  [1, 3, -1, -1, -1],
            "children_right": [2, 4, -1, -1, -1],
            "feature":        [1, 0, -2, -2, -2],
            "threshold":      [0.5, 3.0, -2.0, -2.0, -2.0],
            "value":          [0.0, 0.0, 30.0, 10.0, 20.0]
        });
        let rf = forest(vec![tree], 2).unwrap();
        assert_eq!(rf.predict(&[1.0, 0.0]).unwrap(), 10.0);
        assert_eq!(rf.predict(&[4.0, 0.0]).unwrap(), 20.0);
        assert_eq!(rf.predict(&[4.0, 1.0]).unwrap(), 30.0);
    }

    #[test]
    fn wrong_input_width_is_an_error() {
        let rf = forest(vec![stump(7.5, 1.0, 5.0)], 2).unwrap();
        let err = rf.predict(&[1.0]).unwrap_err();
        assert!(matches!(err, PredictError::FeatureLength { got: 1, expected: 2 }));
    }

    #[test]
    fn rejects_structural_problems() {
        assert!(matches!(forest(vec![], 2), Err(LoadError::InvalidModel(_))));

        // child pointing back at its parent would loop forever
        let cyclic = json!({
            "children_left": [0, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [0, -2, -2],
            "threshold": [1.0, -2.0, -2.0],
            "value": [0.0, 1.0, 2.0]
        });
        assert!(matches!(forest(vec![cyclic], 1), Err(LoadError::InvalidModel(_))));

        let short = json!({
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [0, -2, -2],
            "threshold": [1.0, -2.0],
            "value": [0.0, 1.0, 2.0]
        });
        assert!(matches!(forest(vec![short], 1), Err(LoadError::InvalidModel(_))));

        // feature index past the declared width
        assert!(matches!(
            forest(vec![stump(1.0, 0.0, 1.0)], 0),
            Err(LoadError::InvalidModel(_))
        ));
        let wide = json!({
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [3, -2, -2],
            "threshold": [1.0, -2.0, -2.0],
            "value": [0.0, 1.0, 2.0]
        });
        assert!(matches!(forest(vec![wide], 2), Err(LoadError::InvalidModel(_))));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = RandomForestRegressor::from_json_slice(b"{ not json").unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }
}
