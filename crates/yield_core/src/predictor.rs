//! Single-row prediction over an aligned feature vector

use tracing::debug;

use crate::errors::PredictionError;
use crate::features::FeatureVector;
use crate::gbdt::Model;

/// Run the model on `vector`
///
/// Any incompatibility (names or order differing from the model's schema,
/// non-finite inputs, inference failure) surfaces as one
/// [`PredictionError::Failed`].
pub fn predict(model: &Model, vector: &FeatureVector) -> Result<f64, PredictionError> {
    if vector.names() != model.feature_names() {
        return Err(PredictionError::Failed(format!(
            "feature vector does not match model schema ({} features given, {} expected)",
            vector.len(),
            model.num_features()
        )));
    }
    if let Some((name, value)) = vector.iter().find(|(_, v)| !v.is_finite()) {
        return Err(PredictionError::Failed(format!(
            "feature {name} is not finite ({value})"
        )));
    }

    let estimate = model
        .predict(vector.values())
        .map_err(|e| PredictionError::Failed(e.to_string()))?;
    if !estimate.is_finite() {
        return Err(PredictionError::Failed(format!(
            "model returned a non-finite value ({estimate})"
        )));
    }
    debug!(estimate, "Prediction computed");
    Ok(estimate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reindex;
    use crate::gbdt::{Node, Tree, SCALE};

    fn model() -> Model {
        let tree = Tree::new(
            vec![
                Node::internal(0, 1, 17 * SCALE, 1, 2),
                Node::leaf(1, 30_000 * SCALE),
                Node::leaf(2, 40_000 * SCALE),
            ],
            SCALE,
        );
        Model::new(
            vec![tree],
            0,
            vec!["Year".to_string(), "avg_temp".to_string()],
        )
    }

    #[test]
    fn test_predict_aligned_vector() {
        let model = model();
        let vector = reindex(
            &[("avg_temp".to_string(), 16.0), ("Year".to_string(), 2001.0)],
            model.feature_names(),
        );
        assert_eq!(predict(&model, &vector), Ok(30_000.0));
    }

    #[test]
    fn test_schema_mismatch_fails() {
        let model = model();
        let reordered = FeatureVector::new(
            vec!["avg_temp".to_string(), "Year".to_string()],
            vec![16.0, 2001.0],
        )
        .unwrap();
        assert!(matches!(
            predict(&model, &reordered),
            Err(PredictionError::Failed(_))
        ));

        let short = FeatureVector::new(vec!["Year".to_string()], vec![2001.0]).unwrap();
        assert!(predict(&model, &short).is_err());
    }

    #[test]
    fn test_non_finite_feature_fails() {
        let model = model();
        let vector = FeatureVector::new(
            vec!["Year".to_string(), "avg_temp".to_string()],
            vec![2001.0, f64::NAN],
        )
        .unwrap();
        let err = predict(&model, &vector).unwrap_err();
        assert!(err.to_string().contains("avg_temp"));
    }
}
