//! Auxiliary performance predictor
//!
//! The engine treats the predictor as a black box that maps a 5-float feature
//! vector to an expected performance in [0, 1]. A prediction that errors or
//! times out is simply absent.

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, warn};

use crate::mastery::FeatureVector;
use crate::types::clamp_unit;

#[async_trait::async_trait]
pub trait PerformancePredictor: Send + Sync {
    /// Expected performance for the next practice, or `None` if the
    /// predictor has no opinion
    async fn predict(&self, features: &FeatureVector) -> Result<Option<f64>>;

    fn name(&self) -> &'static str;
}

/// Call a predictor under a deadline. Errors and timeouts are logged and
/// mapped to `None`.
pub async fn predict_with_timeout(
    predictor: &dyn PerformancePredictor,
    features: &FeatureVector,
    timeout: Duration,
) -> Option<f64> {
    match tokio::time::timeout(timeout, predictor.predict(features)).await {
        Ok(Ok(prediction)) => {
            debug!("Predictor {} -> {:?}", predictor.name(), prediction);
            prediction.map(clamp_unit)
        }
        Ok(Err(e)) => {
            warn!("Predictor {} failed: {}", predictor.name(), e);
            None
        }
        Err(_) => {
            warn!("Predictor {} timed out after {:?}", predictor.name(), timeout);
            None
        }
    }
}

/// Deterministic linear stand-in usable without a trained model
#[derive(Debug, Clone)]
pub struct HeuristicPredictor {
    /// Weights for [performance, time, difficulty, success rate, last delta]
    pub weights: [f64; 5],
    pub bias: f64,
}

impl Default for HeuristicPredictor {
    fn default() -> Self {
        Self {
            weights: [0.6, -0.05, -0.1, 0.3, 0.2],
            bias: 0.05,
        }
    }
}

#[async_trait::async_trait]
impl PerformancePredictor for HeuristicPredictor {
    async fn predict(&self, features: &FeatureVector) -> Result<Option<f64>> {
        let raw = self.weights.iter()
            .zip(features.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        Ok(Some(clamp_unit(raw)))
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

/// Never predicts; used when the predictor is disabled
#[derive(Debug, Clone, Default)]
pub struct NullPredictor;

#[async_trait::async_trait]
impl PerformancePredictor for NullPredictor {
    async fn predict(&self, _features: &FeatureVector) -> Result<Option<f64>> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowPredictor;

    #[async_trait::async_trait]
    impl PerformancePredictor for SlowPredictor {
        async fn predict(&self, _features: &FeatureVector) -> Result<Option<f64>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Some(1.0))
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    struct FailingPredictor;

    #[async_trait::async_trait]
    impl PerformancePredictor for FailingPredictor {
        async fn predict(&self, _features: &FeatureVector) -> Result<Option<f64>> {
            anyhow::bail!("model not loaded")
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_heuristic_in_range() {
        let prediction = predict_with_timeout(
            &HeuristicPredictor::default(),
            &[0.9, 0.5, 0.8, 1.0, 0.1],
            Duration::from_millis(100),
        )
        .await;
        let value = prediction.unwrap();
        assert!((0.0..=1.0).contains(&value));
    }

    #[tokio::test]
    async fn test_timeout_is_absent() {
        let prediction = predict_with_timeout(&SlowPredictor, &[0.0; 5], Duration::from_millis(10)).await;
        assert!(prediction.is_none());
    }

    #[tokio::test]
    async fn test_error_is_absent() {
        let prediction = predict_with_timeout(&FailingPredictor, &[0.0; 5], Duration::from_millis(100)).await;
        assert!(prediction.is_none());
        assert!(predict_with_timeout(&NullPredictor, &[0.0; 5], Duration::from_millis(100)).await.is_none());
    }
}
