//! Import of XGBoost JSON tree dumps
//!
//! Converts the output of `Booster.dump_model(path, dump_format="json")` into
//! a fixed-point [`Model`]. XGBoost sends a row to the `yes` child when
//! `x < split_condition`; with quantized inputs that is
//! `x_q <= ceil(t * scale) - 1`, which is the threshold stored here.
//!
//! Boolean columns are dumped as indicator splits without a
//! `split_condition`; they become a split at `scale / 2` that takes `no`
//! for 0 and `yes` for 1.

use std::collections::{HashMap, VecDeque};

use serde::Deserialize;
use tracing::info;

use super::model::{Model, ModelError};
use super::tree::{Node, Tree};

#[derive(Debug, Deserialize)]
struct DumpNode {
    nodeid: usize,
    #[serde(default)]
    split: Option<String>,
    #[serde(default)]
    split_condition: Option<f64>,
    #[serde(default)]
    yes: Option<usize>,
    #[serde(default)]
    no: Option<usize>,
    #[serde(default)]
    leaf: Option<f64>,
    #[serde(default)]
    children: Vec<DumpNode>,
}

/// Build a model from a JSON dump, the booster's `base_score`, and its feature names
pub fn from_xgboost_dump(
    dump_json: &str,
    feature_names: Vec<String>,
    base_score: f64,
    scale: i64,
) -> Result<Model, ModelError> {
    if scale <= 0 {
        return Err(ModelError::InvalidFormat(format!("invalid scale {scale}")));
    }
    let dump: Vec<DumpNode> = serde_json::from_str(dump_json)?;

    let mut trees = Vec::with_capacity(dump.len());
    for (t, root) in dump.iter().enumerate() {
        let tree = convert_tree(root, &feature_names, scale)
            .map_err(|e| ModelError::InvalidFormat(format!("tree {t}: {e}")))?;
        trees.push(tree);
    }

    let bias = to_fixed(base_score, scale)
        .ok_or_else(|| ModelError::InvalidFormat(format!("base_score {base_score} out of range")))?;
    let model = Model::with_scale(trees, bias, feature_names, scale, scale);
    model.validate()?;

    info!(
        trees = model.num_trees(),
        features = model.num_features(),
        "Converted XGBoost dump"
    );
    Ok(model)
}

fn to_fixed(value: f64, scale: i64) -> Option<i64> {
    let scaled = (value * scale as f64).round();
    (scaled.is_finite() && scaled.abs() < i64::MAX as f64).then_some(scaled as i64)
}

/// Largest quantized input that still satisfies `x < condition`
fn strict_threshold(condition: f64, scale: i64) -> Option<i64> {
    let scaled = (condition * scale as f64).ceil();
    (scaled.is_finite() && scaled.abs() < i64::MAX as f64).then_some(scaled as i64 - 1)
}

fn resolve_feature(split: &str, feature_names: &[String]) -> Result<i32, String> {
    let index = feature_names
        .iter()
        .position(|n| n == split)
        .or_else(|| {
            split
                .strip_prefix('f')
                .and_then(|digits| digits.parse::<usize>().ok())
                .filter(|idx| *idx < feature_names.len())
        })
        .ok_or_else(|| format!("unknown split feature {split:?}"))?;
    i32::try_from(index).map_err(|_| format!("feature index {index} too large"))
}

fn convert_tree(root: &DumpNode, feature_names: &[String], scale: i64) -> Result<Tree, String> {
    // Breadth-first order puts every child after its parent; pruned dumps
    // may skip node ids, so ids are renumbered densely in that order.
    let mut order: Vec<&DumpNode> = Vec::new();
    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        order.push(node);
        queue.extend(node.children.iter());
    }

    let mut dense: HashMap<usize, i32> = HashMap::with_capacity(order.len());
    for (idx, node) in order.iter().enumerate() {
        let idx = i32::try_from(idx).map_err(|_| "tree too large".to_string())?;
        if dense.insert(node.nodeid, idx).is_some() {
            return Err(format!("duplicate node id {}", node.nodeid));
        }
    }
    let child = |from: usize, to: usize| {
        dense
            .get(&to)
            .copied()
            .ok_or_else(|| format!("node {from} points at missing node {to}"))
    };

    let mut nodes = Vec::with_capacity(order.len());
    for (idx, node) in order.iter().enumerate() {
        let id = i32::try_from(idx).map_err(|_| "tree too large".to_string())?;
        let converted = match node.leaf {
            Some(value) => Node::leaf(
                id,
                to_fixed(value, scale).ok_or_else(|| format!("leaf {value} out of range"))?,
            ),
            None => {
                let split = node
                    .split
                    .as_deref()
                    .ok_or_else(|| format!("node {} has neither split nor leaf", node.nodeid))?;
                let (yes, no) = node
                    .yes
                    .zip(node.no)
                    .ok_or_else(|| format!("node {} is missing yes/no children", node.nodeid))?;
                let (yes, no) = (child(node.nodeid, yes)?, child(node.nodeid, no)?);
                let feature = resolve_feature(split, feature_names)?;
                match node.split_condition {
                    Some(condition) => Node::internal(
                        id,
                        feature,
                        strict_threshold(condition, scale)
                            .ok_or_else(|| format!("threshold {condition} out of range"))?,
                        yes,
                        no,
                    ),
                    // Indicator split on a boolean column: `yes` when the flag is set
                    None => Node::internal(id, feature, scale / 2, no, yes),
                }
            }
        };
        nodes.push(converted);
    }
    Ok(Tree::new(nodes, scale))
}
