//! Gradient Boosted Decision Tree inference
//!
//! Integer fixed-point evaluator for regression ensembles with named inputs.
//!
//! # Model Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "scale": 1000000,
//!   "post_scale": 1000000,
//!   "bias": 0,
//!   "feature_names": ["Year", "avg_temp"],
//!   "trees": [
//!     {
//!       "nodes": [
//!         {"id":0,"left":1,"right":2,"feature_idx":1,"threshold":18500000,"leaf":null},
//!         {"id":1,"left":-1,"right":-1,"feature_idx":-1,"threshold":0,"leaf":-234000},
//!         {"id":2,"left":-1,"right":-1,"feature_idx":-1,"threshold":0,"leaf":456000}
//!       ],
//!       "weight": 1000000
//!     }
//!   ]
//! }
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use cropcast_core::gbdt::{Model, Node, Tree, SCALE};
//!
//! let tree = Tree::new(
//!     vec![
//!         Node::internal(0, 0, 50 * SCALE, 1, 2),
//!         Node::leaf(1, 100 * SCALE),
//!         Node::leaf(2, 200 * SCALE),
//!     ],
//!     SCALE,
//! );
//! let model = Model::new(vec![tree], 0, vec!["avg_temp".to_string()]);
//!
//! let yield_estimate = model.predict(&[18.5]).unwrap();
//! let hash = model.hash_hex().unwrap();
//! ```

pub mod model;
pub mod tree;
pub mod xgboost;

pub use model::{Model, ModelError, MODEL_VERSION, SCALE};
pub use tree::{Node, Tree};

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn stump(feature: i32, threshold: i64, left: i64, right: i64) -> Tree {
        Tree::new(
            vec![
                Node::internal(0, feature, threshold, 1, 2),
                Node::leaf(1, left),
                Node::leaf(2, right),
            ],
            SCALE,
        )
    }

    #[test]
    fn test_two_tree_model_on_named_inputs() {
        let names = vec!["Year".to_string(), "avg_temp".to_string()];
        let model = Model::new(
            vec![
                stump(0, 2000 * SCALE, 30_000 * SCALE, 35_000 * SCALE),
                stump(1, 18 * SCALE, -1_000 * SCALE, 2_000 * SCALE),
            ],
            0,
            names,
        );

        assert_eq!(model.predict(&[1999.0, 16.0]).unwrap(), 29_000.0);
        assert_eq!(model.predict(&[2001.0, 19.5]).unwrap(), 37_000.0);
    }

    #[test]
    fn test_repeated_inference_is_identical() {
        let model = Model::new(
            vec![stump(0, 50 * SCALE, 100 * SCALE, 200 * SCALE)],
            0,
            vec!["x".to_string()],
        );
        let first = model.predict(&[42.0]).unwrap();
        for _ in 0..100 {
            assert_eq!(model.predict(&[42.0]).unwrap().to_bits(), first.to_bits());
        }
    }

    #[test]
    fn test_bias_only_model() {
        let model = Model::new(Vec::new(), 123_456_789, vec!["x".to_string()]);
        assert_eq!(model.predict(&[0.0]).unwrap(), 123.456789);
    }
}
