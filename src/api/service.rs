use tracing::debug;

use super::features::{encode_live, encode_pre_match};
use super::schema::{
    LiveRequest, LiveResponse, PreMatchRequest, PreMatchResponse, LIVE_PREDICTION_TIME,
};
use crate::model::{InferenceError, ModelStore};

/// Probability at or above which Team 1 is named the winner.
pub const WINNER_THRESHOLD: f64 = 0.5;

pub const TEAM_1: &str = "Team 1";
pub const TEAM_2: &str = "Team 2";

/// Stateless prediction orchestration over an immutable model store.
#[derive(Clone)]
pub struct PredictionService {
    models: ModelStore,
}

impl PredictionService {
    pub fn new(models: ModelStore) -> Self {
        PredictionService { models }
    }

    pub fn models(&self) -> &ModelStore {
        &self.models
    }

    /// Encode, infer, round, label.
    pub fn predict_pre_match(
        &self,
        req: &PreMatchRequest,
    ) -> Result<PreMatchResponse, InferenceError> {
        let features = encode_pre_match(req).to_vector();
        let p = checked(self.models.pre_match.predict_probability(&features)?)?;
        debug!("pre-match features={:?} p={:.6}", features, p);
        Ok(PreMatchResponse {
            prediction_probability: round4(p),
            prediction_winner: winner_label(p).to_string(),
        })
    }

    pub fn predict_live_wpa(&self, req: &LiveRequest) -> Result<LiveResponse, InferenceError> {
        let features = encode_live(req).to_vector();
        let p = checked(self.models.live.predict_probability(&features)?)?;
        debug!("live features={:?} p={:.6}", features, p);
        Ok(LiveResponse {
            win_probability: round4(p),
            prediction_time: LIVE_PREDICTION_TIME.to_string(),
        })
    }
}

/// Winner from the unrounded probability. Exactly 0.5 goes to Team 1.
pub fn winner_label(p: f64) -> &'static str {
    if p >= WINNER_THRESHOLD {
        TEAM_1
    } else {
        TEAM_2
    }
}

/// Round to 4 decimals, exact halves to even (0.03125 -> 0.0312).
pub fn round4(p: f64) -> f64 {
    (p * 10_000.0).round_ties_even() / 10_000.0
}

fn checked(p: f64) -> Result<f64, InferenceError> {
    if p.is_finite() {
        Ok(p.clamp(0.0, 1.0))
    } else {
        Err(InferenceError::NonFinite)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::schema::TossDecision;
    use crate::model::{Classifier, ModelInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Returns a fixed probability and records every vector it was given.
    pub(crate) struct FixedClassifier {
        pub p: f64,
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<Vec<f64>>>,
    }

    impl FixedClassifier {
        pub(crate) fn new(p: f64) -> Arc<Self> {
            Arc::new(FixedClassifier {
                p,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Classifier for FixedClassifier {
        fn predict_probability(&self, features: &[f64]) -> Result<f64, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(features.to_vec());
            Ok(self.p)
        }

        fn info(&self) -> ModelInfo {
            ModelInfo {
                kind: "fixed".to_string(),
                num_features: 4,
                num_trees: 0,
                feature_names: Vec::new(),
            }
        }
    }

    pub(crate) fn service_with(pre: Arc<FixedClassifier>, live: Arc<FixedClassifier>) -> PredictionService {
        PredictionService::new(ModelStore::new(pre, live))
    }

    fn sample_pre_match() -> PreMatchRequest {
        PreMatchRequest {
            hist_win_pct_diff: 3.0,
            form_diff: 0.1,
            venue_bias_delta: 1.5,
            toss_decision: TossDecision::Field,
        }
    }

    fn sample_live() -> LiveRequest {
        LiveRequest {
            cumulative_runs: 75.0,
            current_over: 8.0,
            run_rate: 7.5,
            balls_remaining: 75,
        }
    }

    #[test]
    fn test_pre_match_feeds_encoded_vector_to_model() {
        let pre = FixedClassifier::new(0.62);
        let svc = service_with(pre.clone(), FixedClassifier::new(0.5));
        svc.predict_pre_match(&sample_pre_match()).unwrap();
        assert_eq!(pre.seen.lock().unwrap()[0], vec![3.0, 0.1, 1.5, 1.0]);
    }

    #[test]
    fn test_pre_match_rounds_and_labels() {
        let svc = service_with(FixedClassifier::new(0.623_456_7), FixedClassifier::new(0.5));
        let resp = svc.predict_pre_match(&sample_pre_match()).unwrap();
        assert_eq!(resp.prediction_probability, 0.6235);
        assert_eq!(resp.prediction_winner, "Team 1");
    }

    #[test]
    fn test_winner_uses_unrounded_probability() {
        // 0.49996 rounds to 0.5 but is still below the threshold.
        let svc = service_with(FixedClassifier::new(0.499_96), FixedClassifier::new(0.5));
        let resp = svc.predict_pre_match(&sample_pre_match()).unwrap();
        assert_eq!(resp.prediction_probability, 0.5);
        assert_eq!(resp.prediction_winner, "Team 2");
    }

    #[test]
    fn test_exact_half_goes_to_team_1() {
        assert_eq!(winner_label(0.5), TEAM_1);
        assert_eq!(winner_label(0.499_999_9), TEAM_2);
        assert_eq!(winner_label(1.0), TEAM_1);
        assert_eq!(winner_label(0.0), TEAM_2);
    }

    #[test]
    fn test_rounding_preserves_side_outside_neighbourhood() {
        let mut p = 0.0;
        while p <= 1.0 {
            if (p - 0.5f64).abs() > 0.000_05 {
                assert_eq!(
                    winner_label(p),
                    winner_label(round4(p)),
                    "p={} rounded={}",
                    p,
                    round4(p)
                );
            }
            p += 0.000_013;
        }
    }

    #[test]
    fn test_round4_exact_halves_go_to_even() {
        // f32 model outputs can land exactly on a half at the 5th decimal.
        assert_eq!(round4(0.03125), 0.0312);
        assert_eq!(round4(0.09375), 0.0938);
        assert_eq!(round4(0.5), 0.5);
        assert_eq!(round4(0.123_46), 0.1235);

        let svc = service_with(FixedClassifier::new(0.03125), FixedClassifier::new(0.5));
        let resp = svc.predict_pre_match(&sample_pre_match()).unwrap();
        assert_eq!(resp.prediction_probability, 0.0312);
    }

    #[test]
    fn test_live_response_shape() {
        let live = FixedClassifier::new(0.731_28);
        let svc = service_with(FixedClassifier::new(0.5), live.clone());
        let resp = svc.predict_live_wpa(&sample_live()).unwrap();
        assert_eq!(resp.win_probability, 0.7313);
        assert_eq!(resp.prediction_time, "In-Play (Ball-by-Ball)");
        assert_eq!(live.seen.lock().unwrap()[0], vec![75.0, 8.0, 7.5, 75.0]);
    }

    #[test]
    fn test_identical_requests_identical_responses() {
        let svc = service_with(FixedClassifier::new(0.417_77), FixedClassifier::new(0.9));
        let a = svc.predict_pre_match(&sample_pre_match()).unwrap();
        let b = svc.predict_pre_match(&sample_pre_match()).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.prediction_probability.to_bits(),
            b.prediction_probability.to_bits()
        );
        let c = svc.predict_live_wpa(&sample_live()).unwrap();
        let d = svc.predict_live_wpa(&sample_live()).unwrap();
        assert_eq!(c.win_probability.to_bits(), d.win_probability.to_bits());
    }

    #[test]
    fn test_non_finite_probability_is_inference_error() {
        let svc = service_with(FixedClassifier::new(f64::NAN), FixedClassifier::new(0.5));
        let err = svc.predict_pre_match(&sample_pre_match()).unwrap_err();
        assert_eq!(err, InferenceError::NonFinite);
    }

    #[test]
    fn test_probability_clamped_to_unit_interval() {
        let svc = service_with(FixedClassifier::new(1.2), FixedClassifier::new(-0.1));
        assert_eq!(svc.predict_pre_match(&sample_pre_match()).unwrap().prediction_probability, 1.0);
        assert_eq!(svc.predict_live_wpa(&sample_live()).unwrap().win_probability, 0.0);
    }
}
