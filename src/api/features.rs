//! Feature encoding for both classifiers.
//!
//! The field order of each feature struct is the column order the model was
//! trained on. Reordering fields here silently changes predictions, so the
//! array layout is produced in one place only (`to_vector`).

use super::schema::{LiveRequest, PreMatchRequest, TossDecision};

/// Width of both feature vectors.
pub const FEATURE_COUNT: usize = 4;

/// Pre-match model input, in training column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreMatchFeatures {
    pub hist_win_pct_diff: f64,
    pub form_diff: f64,
    pub venue_bias_delta: f64,
    /// 1.0 when the toss winner chose to field, 0.0 when they chose to bat
    pub toss_decision_field: f64,
}

impl PreMatchFeatures {
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.hist_win_pct_diff,
            self.form_diff,
            self.venue_bias_delta,
            self.toss_decision_field,
        ]
    }
}

/// Live (second innings) model input, in training column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveFeatures {
    pub cumulative_runs: f64,
    pub current_over: f64,
    pub run_rate: f64,
    pub balls_remaining: f64,
}

impl LiveFeatures {
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.cumulative_runs,
            self.current_over,
            self.run_rate,
            self.balls_remaining,
        ]
    }
}

/// One-hot indicator for the "field" toss choice.
pub fn toss_indicator(decision: TossDecision) -> f64 {
    match decision {
        TossDecision::Field => 1.0,
        TossDecision::Bat => 0.0,
    }
}

/// Encode a validated pre-match request. No bounds are checked here.
pub fn encode_pre_match(req: &PreMatchRequest) -> PreMatchFeatures {
    PreMatchFeatures {
        hist_win_pct_diff: req.hist_win_pct_diff,
        form_diff: req.form_diff,
        venue_bias_delta: req.venue_bias_delta,
        toss_decision_field: toss_indicator(req.toss_decision),
    }
}

/// Encode a validated live request. All fields are numeric already.
pub fn encode_live(req: &LiveRequest) -> LiveFeatures {
    LiveFeatures {
        cumulative_runs: req.cumulative_runs,
        current_over: req.current_over,
        run_rate: req.run_rate,
        balls_remaining: req.balls_remaining as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pre_match(h: f64, f: f64, v: f64, toss: TossDecision) -> PreMatchRequest {
        PreMatchRequest {
            hist_win_pct_diff: h,
            form_diff: f,
            venue_bias_delta: v,
            toss_decision: toss,
        }
    }

    #[test]
    fn test_toss_indicator_values() {
        assert_eq!(toss_indicator(TossDecision::Field), 1.0);
        assert_eq!(toss_indicator(TossDecision::Bat), 0.0);
    }

    #[test]
    fn test_neutral_pre_match_is_all_zero() {
        let v = encode_pre_match(&pre_match(0.0, 0.0, 0.0, TossDecision::Bat)).to_vector();
        assert_eq!(v, [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_pre_match_column_order() {
        let v = encode_pre_match(&pre_match(3.0, 0.1, 1.5, TossDecision::Field)).to_vector();
        assert_eq!(v, [3.0, 0.1, 1.5, 1.0]);
    }

    #[test]
    fn test_pre_match_passes_values_through_unchanged() {
        let v = encode_pre_match(&pre_match(-250.0, 7.25, -0.001, TossDecision::Bat)).to_vector();
        assert_eq!(v, [-250.0, 7.25, -0.001, 0.0]);
    }

    #[test]
    fn test_live_column_order() {
        let req = LiveRequest {
            cumulative_runs: 75.0,
            current_over: 8.0,
            run_rate: 7.5,
            balls_remaining: 75,
        };
        assert_eq!(encode_live(&req).to_vector(), [75.0, 8.0, 7.5, 75.0]);
    }

    #[test]
    fn test_live_out_of_domain_values_not_clamped() {
        let req = LiveRequest {
            cumulative_runs: 0.0,
            current_over: 25.0,
            run_rate: -2.0,
            balls_remaining: 0,
        };
        assert_eq!(encode_live(&req).to_vector(), [0.0, 25.0, -2.0, 0.0]);
    }
}
