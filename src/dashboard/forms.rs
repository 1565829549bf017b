//! Dashboard form limits and result rendering.
//!
//! These bounds are the dashboard's own and are tighter than what the
//! prediction API accepts. The page reads them from `/api/config` to build
//! its sliders, and the handlers check them again on submit.

use serde::{Deserialize, Serialize};

use crate::api::schema::{
    LiveRequest, LiveResponse, PreMatchRequest, PreMatchResponse, TossDecision,
};
use crate::api::service::round4;

/// Bounds and default for one numeric input.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct InputSpec {
    pub field: &'static str,
    pub label: &'static str,
    pub min: f64,
    /// `None` means unbounded above
    pub max: Option<f64>,
    pub step: f64,
    pub default: f64,
    /// Only whole numbers are accepted
    pub whole: bool,
    /// "slider" | "number"
    pub widget: &'static str,
}

pub const HIST_WIN_PCT_DIFF: InputSpec = InputSpec {
    field: "hist_win_pct_diff",
    label: "Historical Win % Diff",
    min: -15.0,
    max: Some(15.0),
    step: 0.5,
    default: 3.0,
    whole: false,
    widget: "slider",
};

pub const FORM_DIFF: InputSpec = InputSpec {
    field: "form_diff",
    label: "Recent Form Diff (Last 5 Games)",
    min: -1.0,
    max: Some(1.0),
    step: 0.05,
    default: 0.1,
    whole: false,
    widget: "slider",
};

pub const VENUE_BIAS_DELTA: InputSpec = InputSpec {
    field: "venue_bias_delta",
    label: "Venue Bias Delta (Defend - Chase)",
    min: -10.0,
    max: Some(10.0),
    step: 0.5,
    default: 1.5,
    whole: false,
    widget: "slider",
};

pub const CUMULATIVE_RUNS: InputSpec = InputSpec {
    field: "cumulative_runs",
    label: "Runs Scored by Chasing Team",
    min: 0.0,
    max: None,
    step: 1.0,
    default: 75.0,
    whole: true,
    widget: "number",
};

pub const CURRENT_OVER: InputSpec = InputSpec {
    field: "current_over",
    label: "Completed Overs",
    min: 0.0,
    max: Some(19.0),
    step: 1.0,
    default: 8.0,
    whole: true,
    widget: "number",
};

pub const RUN_RATE: InputSpec = InputSpec {
    field: "run_rate",
    label: "Current Run Rate (RPO)",
    min: 4.0,
    max: Some(12.0),
    step: 0.1,
    default: 7.5,
    whole: false,
    widget: "slider",
};

pub const BALLS_REMAINING: InputSpec = InputSpec {
    field: "balls_remaining",
    label: "Balls Remaining",
    min: 1.0,
    max: Some(120.0),
    step: 1.0,
    default: 75.0,
    whole: true,
    widget: "number",
};

pub const PRE_MATCH_INPUTS: [InputSpec; 3] = [HIST_WIN_PCT_DIFF, FORM_DIFF, VENUE_BIAS_DELTA];
pub const LIVE_INPUTS: [InputSpec; 4] = [CUMULATIVE_RUNS, CURRENT_OVER, RUN_RATE, BALLS_REMAINING];

/// Radio options for the toss, in display order.
pub const TOSS_OPTIONS: [TossDecision; 2] = [TossDecision::Field, TossDecision::Bat];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{label}: {message}")]
pub struct FormError {
    pub field: &'static str,
    pub label: &'static str,
    pub message: String,
}

impl InputSpec {
    /// Check a submitted value against this input's bounds.
    pub fn check(&self, value: f64) -> Result<f64, FormError> {
        let fail = |message: String| FormError {
            field: self.field,
            label: self.label,
            message,
        };
        if !value.is_finite() {
            return Err(fail("must be a number".to_string()));
        }
        if value < self.min {
            return Err(fail(format!("must be at least {}", self.min)));
        }
        if let Some(max) = self.max {
            if value > max {
                return Err(fail(format!("must be at most {}", max)));
            }
        }
        if self.whole && value.fract() != 0.0 {
            return Err(fail("must be a whole number".to_string()));
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PreMatchForm {
    pub hist_win_pct_diff: f64,
    pub form_diff: f64,
    pub venue_bias_delta: f64,
    pub toss_decision: TossDecision,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LiveForm {
    pub cumulative_runs: f64,
    pub current_over: f64,
    pub run_rate: f64,
    pub balls_remaining: f64,
}

impl PreMatchForm {
    pub fn into_request(self) -> Result<PreMatchRequest, FormError> {
        Ok(PreMatchRequest {
            hist_win_pct_diff: HIST_WIN_PCT_DIFF.check(self.hist_win_pct_diff)?,
            form_diff: FORM_DIFF.check(self.form_diff)?,
            venue_bias_delta: VENUE_BIAS_DELTA.check(self.venue_bias_delta)?,
            toss_decision: self.toss_decision,
        })
    }
}

impl LiveForm {
    pub fn into_request(self) -> Result<LiveRequest, FormError> {
        Ok(LiveRequest {
            cumulative_runs: CUMULATIVE_RUNS.check(self.cumulative_runs)?,
            current_over: CURRENT_OVER.check(self.current_over)?,
            run_rate: RUN_RATE.check(self.run_rate)?,
            balls_remaining: BALLS_REMAINING.check(self.balls_remaining)? as i64,
        })
    }
}

// ── Rendering ────────────────────────────────────────────────────────────────

/// What the page shows after a successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    /// "success" | "error" | "metric"
    pub tone: &'static str,
    pub title: String,
    pub headline: String,
    pub detail: Option<String>,
}

pub fn render_pre_match(resp: &PreMatchResponse) -> ResultView {
    let p = resp.prediction_probability;
    if p >= 0.5 {
        ResultView {
            tone: "success",
            title: "Prediction".to_string(),
            headline: format!("Team 1 Win Probability: {:.2}%", p * 100.0),
            detail: None,
        }
    } else {
        ResultView {
            tone: "error",
            title: "Prediction".to_string(),
            headline: format!("Team 2 Win Probability: {:.2}%", (1.0 - p) * 100.0),
            detail: None,
        }
    }
}

pub fn render_live(resp: &LiveResponse) -> ResultView {
    let p = resp.win_probability;
    let margin = round4(p - 0.5) * 200.0;
    ResultView {
        tone: "metric",
        title: "Chasing Team Win Probability".to_string(),
        headline: format!("{:.2}%", p * 100.0),
        detail: Some(format!("{:.2} Pct. Margin", margin)),
    }
}
