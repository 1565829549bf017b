use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Label attached to every live-match response.
pub const LIVE_PREDICTION_TIME: &str = "In-Play (Ball-by-Ball)";

/// Choice made by the toss winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TossDecision {
    Bat,
    Field,
}

impl TossDecision {
    /// Parse the exact wire literal. Case and whitespace are significant.
    pub fn from_literal(s: &str) -> Option<Self> {
        match s {
            "bat" => Some(TossDecision::Bat),
            "field" => Some(TossDecision::Field),
            _ => None,
        }
    }
}

/// Pre-match features. Every differential is Team 1's value minus Team 2's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreMatchRequest {
    pub hist_win_pct_diff: f64,
    pub form_diff: f64,
    pub venue_bias_delta: f64,
    pub toss_decision: TossDecision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreMatchResponse {
    /// Team 1 win probability, rounded to 4 decimals
    pub prediction_probability: f64,
    /// "Team 1" | "Team 2"
    pub prediction_winner: String,
}

/// State of the second innings as seen by the chasing team.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveRequest {
    /// Runs scored by the chasing team so far
    pub cumulative_runs: f64,
    /// Completed overs (0-19)
    pub current_over: f64,
    /// Current run rate of the chasing team
    pub run_rate: f64,
    /// Balls remaining in the innings
    pub balls_remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveResponse {
    /// Chasing team win probability, rounded to 4 decimals
    pub win_probability: f64,
    pub prediction_time: String,
}

// ── Validation ───────────────────────────────────────────────────────────────

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Request body failed schema validation. Carries every field error found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed ({})", summarize(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn body(message: impl Into<String>) -> Self {
        ValidationError {
            errors: vec![FieldError::new("body", message)],
        }
    }
}

/// Parse a raw request body into a JSON value, rejecting malformed JSON.
pub fn parse_body(bytes: &[u8]) -> Result<Value, ValidationError> {
    serde_json::from_slice(bytes).map_err(|e| ValidationError::body(format!("invalid JSON: {}", e)))
}

/// Validate a pre-match payload. Unknown fields are ignored.
pub fn validate_pre_match(body: &Value) -> Result<PreMatchRequest, ValidationError> {
    let obj = as_object(body)?;
    let mut errors = Vec::new();

    let hist_win_pct_diff = read_float(obj, "hist_win_pct_diff", &mut errors);
    let form_diff = read_float(obj, "form_diff", &mut errors);
    let venue_bias_delta = read_float(obj, "venue_bias_delta", &mut errors);
    let toss_decision = read_toss(obj, "toss_decision", &mut errors);

    match (hist_win_pct_diff, form_diff, venue_bias_delta, toss_decision) {
        (Some(hist_win_pct_diff), Some(form_diff), Some(venue_bias_delta), Some(toss_decision))
            if errors.is_empty() =>
        {
            Ok(PreMatchRequest {
                hist_win_pct_diff,
                form_diff,
                venue_bias_delta,
                toss_decision,
            })
        }
        _ => Err(ValidationError { errors }),
    }
}

/// Validate a live-match payload. Only types are checked; domain ranges are not.
pub fn validate_live(body: &Value) -> Result<LiveRequest, ValidationError> {
    let obj = as_object(body)?;
    let mut errors = Vec::new();

    let cumulative_runs = read_float(obj, "cumulative_runs", &mut errors);
    let current_over = read_float(obj, "current_over", &mut errors);
    let run_rate = read_float(obj, "run_rate", &mut errors);
    let balls_remaining = read_int(obj, "balls_remaining", &mut errors);

    match (cumulative_runs, current_over, run_rate, balls_remaining) {
        (Some(cumulative_runs), Some(current_over), Some(run_rate), Some(balls_remaining))
            if errors.is_empty() =>
        {
            Ok(LiveRequest {
                cumulative_runs,
                current_over,
                run_rate,
                balls_remaining,
            })
        }
        _ => Err(ValidationError { errors }),
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ValidationError> {
    body.as_object()
        .ok_or_else(|| ValidationError::body("expected a JSON object"))
}

fn read_float(obj: &Map<String, Value>, field: &str, errors: &mut Vec<FieldError>) -> Option<f64> {
    match obj.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field, "field required"));
            None
        }
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() => Some(v),
            _ => {
                errors.push(FieldError::new(field, "number out of range"));
                None
            }
        },
        Some(other) => {
            errors.push(FieldError::new(
                field,
                format!("expected a number, got {}", json_kind(other)),
            ));
            None
        }
    }
}

fn read_int(obj: &Map<String, Value>, field: &str, errors: &mut Vec<FieldError>) -> Option<i64> {
    match obj.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field, "field required"));
            None
        }
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_i64() {
                return Some(v);
            }
            // 75.0 is accepted as 75; 75.5 is not.
            match n.as_f64() {
                Some(v) if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 => {
                    Some(v as i64)
                }
                _ => {
                    errors.push(FieldError::new(field, "expected an integer"));
                    None
                }
            }
        }
        Some(other) => {
            errors.push(FieldError::new(
                field,
                format!("expected an integer, got {}", json_kind(other)),
            ));
            None
        }
    }
}

fn read_toss(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<TossDecision> {
    match obj.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field, "field required"));
            None
        }
        Some(Value::String(s)) => match TossDecision::from_literal(s) {
            Some(t) => Some(t),
            None => {
                errors.push(FieldError::new(
                    field,
                    format!("expected 'bat' or 'field', got '{}'", s),
                ));
                None
            }
        },
        Some(other) => {
            errors.push(FieldError::new(
                field,
                format!("expected a string, got {}", json_kind(other)),
            ));
            None
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pre_match_valid() {
        let req = validate_pre_match(&json!({
            "hist_win_pct_diff": 3.0,
            "form_diff": 0.1,
            "venue_bias_delta": 1.5,
            "toss_decision": "field"
        }))
        .unwrap();
        assert_eq!(req.toss_decision, TossDecision::Field);
        assert_eq!(req.hist_win_pct_diff, 3.0);
    }

    #[test]
    fn test_pre_match_accepts_integers_and_extra_fields() {
        let req = validate_pre_match(&json!({
            "hist_win_pct_diff": -4,
            "form_diff": 0,
            "venue_bias_delta": 2,
            "toss_decision": "bat",
            "team_1": "CSK"
        }))
        .unwrap();
        assert_eq!(req.hist_win_pct_diff, -4.0);
        assert_eq!(req.toss_decision, TossDecision::Bat);
    }

    #[test]
    fn test_pre_match_rejects_unknown_toss_literal() {
        let err = validate_pre_match(&json!({
            "hist_win_pct_diff": 3.0,
            "form_diff": 0.1,
            "venue_bias_delta": 1.5,
            "toss_decision": "bowl"
        }))
        .unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].field, "toss_decision");
    }

    #[test]
    fn test_pre_match_toss_literal_is_case_sensitive() {
        let err = validate_pre_match(&json!({
            "hist_win_pct_diff": 0.0,
            "form_diff": 0.0,
            "venue_bias_delta": 0.0,
            "toss_decision": "Field"
        }))
        .unwrap_err();
        assert_eq!(err.errors[0].field, "toss_decision");
    }

    #[test]
    fn test_pre_match_collects_all_errors() {
        let err = validate_pre_match(&json!({
            "form_diff": "high",
            "venue_bias_delta": null,
            "toss_decision": 1
        }))
        .unwrap_err();
        let fields: Vec<&str> = err.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["hist_win_pct_diff", "form_diff", "venue_bias_delta", "toss_decision"]
        );
    }

    #[test]
    fn test_numeric_strings_rejected() {
        let err = validate_live(&json!({
            "cumulative_runs": "75",
            "current_over": 8,
            "run_rate": "7.5",
            "balls_remaining": "75"
        }))
        .unwrap_err();
        let fields: Vec<&str> = err.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["cumulative_runs", "run_rate", "balls_remaining"]);
        assert_eq!(err.errors[1].message, "expected a number, got string");
    }

    #[test]
    fn test_non_object_body_rejected() {
        let err = validate_live(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.errors[0].field, "body");
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = parse_body(b"{\"cumulative_runs\": ").unwrap_err();
        assert_eq!(err.errors[0].field, "body");
    }

    #[test]
    fn test_live_valid() {
        let req = validate_live(&json!({
            "cumulative_runs": 75.0,
            "current_over": 8.0,
            "run_rate": 7.5,
            "balls_remaining": 75
        }))
        .unwrap();
        assert_eq!(req.balls_remaining, 75);
        assert_eq!(req.run_rate, 7.5);
    }

    #[test]
    fn test_live_balls_remaining_whole_float_accepted() {
        let req = validate_live(&json!({
            "cumulative_runs": 10,
            "current_over": 1,
            "run_rate": 10,
            "balls_remaining": 108.0
        }))
        .unwrap();
        assert_eq!(req.balls_remaining, 108);
    }

    #[test]
    fn test_live_balls_remaining_fraction_rejected() {
        let err = validate_live(&json!({
            "cumulative_runs": 10,
            "current_over": 1,
            "run_rate": 10,
            "balls_remaining": 10.5
        }))
        .unwrap_err();
        assert_eq!(err.errors[0].field, "balls_remaining");
    }

    #[test]
    fn test_live_out_of_domain_values_pass_validation() {
        // Only types are checked here; ranges belong to the dashboard forms.
        let req = validate_live(&json!({
            "cumulative_runs": -5.0,
            "current_over": 42.0,
            "run_rate": -1.0,
            "balls_remaining": -3
        }))
        .unwrap();
        assert_eq!(req.run_rate, -1.0);
        assert_eq!(req.balls_remaining, -3);
    }

    #[test]
    fn test_validation_error_display_lists_fields() {
        let err = ValidationError {
            errors: vec![
                FieldError::new("form_diff", "field required"),
                FieldError::new("toss_decision", "bad"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("form_diff: field required"));
        assert!(msg.contains("toss_decision: bad"));
    }
}
