//! Decision tree structures for GBDT inference
//!
//! Nodes hold fixed-point integers at the model's scale. Traversal goes left
//! when `feature <= threshold`.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// Internal nodes carry `feature_idx >= 0` and child indices into the
/// tree's node list. Leaves carry `feature_idx == -1` and a `leaf` value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Node {
    /// Node ID as assigned by the exporter
    pub id: i32,

    /// Left child index (-1 for leaves)
    pub left: i32,

    /// Right child index (-1 for leaves)
    pub right: i32,

    /// Feature index to split on (-1 for leaves)
    #[serde(rename = "feature_idx", alias = "feature")]
    pub feature_idx: i32,

    /// Split threshold (fixed-point)
    pub threshold: i64,

    /// Leaf value (fixed-point)
    pub leaf: Option<i64>,
}

impl Node {
    pub fn internal(id: i32, feature_idx: i32, threshold: i64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    pub fn leaf(id: i32, value: i64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx < 0 || self.leaf.is_some()
    }
}

/// One regression tree of the ensemble
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tree {
    /// Node 0 is the root
    pub nodes: Vec<Node>,

    /// Weight applied to this tree's leaf (fixed-point)
    pub weight: i64,
}

impl Tree {
    pub fn new(nodes: Vec<Node>, weight: i64) -> Self {
        Self { nodes, weight }
    }

    /// Leaf value reached by `features`
    ///
    /// Returns `None` when the walk leaves the node list or needs a feature
    /// the input does not have; validated trees never do.
    pub fn evaluate(&self, features: &[i64]) -> Option<i64> {
        let mut idx = 0usize;
        // Children always follow their parent, so a walk visits each node at most once.
        for _ in 0..self.nodes.len() {
            let node = self.nodes.get(idx)?;
            if node.is_leaf() {
                return node.leaf;
            }
            let value = *features.get(usize::try_from(node.feature_idx).ok()?)?;
            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };
            idx = usize::try_from(next).ok()?;
        }
        None
    }

    /// Check structure against a model with `num_features` inputs
    pub fn validate(&self, num_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        let len = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                if node.leaf.is_none() {
                    return Err(format!("leaf node {i} has no leaf value"));
                }
                continue;
            }

            for (side, child) in [("left", node.left), ("right", node.right)] {
                let in_range = usize::try_from(child).map_or(false, |c| c > i && c < len);
                if !in_range {
                    return Err(format!("node {i} has invalid {side} child {child}"));
                }
            }

            let feature_ok =
                usize::try_from(node.feature_idx).map_or(false, |f| f < num_features);
            if !feature_ok {
                return Err(format!(
                    "node {i} splits on feature {} but the model has {num_features}",
                    node.feature_idx
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        // if feature[0] <= 50 then 100 else 200
        Tree::new(
            vec![
                Node::internal(0, 0, 50, 1, 2),
                Node::leaf(1, 100),
                Node::leaf(2, 200),
            ],
            1_000_000,
        )
    }

    #[test]
    fn test_node_kinds() {
        let internal = Node::internal(0, 3, 12345, 1, 2);
        assert!(!internal.is_leaf());
        assert_eq!(internal.leaf, None);

        let leaf = Node::leaf(1, -234);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.feature_idx, -1);
        assert_eq!(leaf.leaf, Some(-234));
    }

    #[test]
    fn test_evaluation_goes_left_on_equal() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[30]), Some(100));
        assert_eq!(tree.evaluate(&[50]), Some(100));
        assert_eq!(tree.evaluate(&[60]), Some(200));
    }

    #[test]
    fn test_evaluation_missing_feature() {
        assert_eq!(stump().evaluate(&[]), None);
    }

    #[test]
    fn test_validation() {
        assert!(stump().validate(1).is_ok());
        assert!(stump().validate(0).is_err());

        let out_of_bounds = Tree::new(
            vec![
                Node::internal(0, 0, 50, 5, 2),
                Node::leaf(1, 100),
                Node::leaf(2, 200),
            ],
            1_000_000,
        );
        assert!(out_of_bounds.validate(1).is_err());

        // Child pointing back at an ancestor
        let cyclic = Tree::new(
            vec![
                Node::internal(0, 0, 50, 1, 2),
                Node::internal(1, 0, 10, 0, 2),
                Node::leaf(2, 200),
            ],
            1_000_000,
        );
        assert!(cyclic.validate(1).is_err());
        assert!(Tree::new(Vec::new(), 1).validate(1).is_err());
    }

    #[test]
    fn test_cyclic_walk_terminates() {
        let cyclic = Tree::new(
            vec![Node::internal(0, 0, 50, 0, 0)],
            1_000_000,
        );
        assert_eq!(cyclic.evaluate(&[10]), None);
    }
}
