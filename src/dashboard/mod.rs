pub mod client;
pub mod forms;

pub use client::{PredictionClient, TransportError};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use forms::{
    render_live, render_pre_match, FormError, LiveForm, PreMatchForm, ResultView, LIVE_INPUTS,
    PRE_MATCH_INPUTS, TOSS_OPTIONS,
};

#[derive(Clone)]
pub struct AppState {
    pub client: PredictionClient,
}

/// Why a dashboard submission produced no prediction.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("{0}")]
    Body(String),
    #[error("API Connection Error: Ensure the prediction API is running at {base_url}")]
    Transport {
        base_url: String,
        #[source]
        source: TransportError,
    },
}

impl From<JsonRejection> for DashboardError {
    fn from(r: JsonRejection) -> Self {
        DashboardError::Body(r.body_text())
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        match &self {
            DashboardError::Form(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": self.to_string(), "field": e.field })),
            )
                .into_response(),
            DashboardError::Body(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            DashboardError::Transport { source, .. } => {
                warn!("Prediction API call failed: {}", source);
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({
                        "error": self.to_string(),
                        "endpoint": source.url(),
                        "details": source.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

/// Build the Axum router for the dashboard.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/config", get(config_handler))
        .route("/api/pre_match", post(pre_match_handler))
        .route("/api/live_wpa", post(live_wpa_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Serve the dashboard HTML page, injecting the API base URL.
async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let html = DASHBOARD_HTML.replace(
        "<body>",
        &format!(
            r#"<body data-api="{}">"#,
            state.client.base_url().replace('"', "&quot;")
        ),
    );
    Html(html)
}

/// GET /api/config
async fn config_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "api_base_url": state.client.base_url(),
        "pre_match": { "inputs": PRE_MATCH_INPUTS, "toss_options": TOSS_OPTIONS },
        "live": { "inputs": LIVE_INPUTS },
    }))
}

/// POST /api/pre_match
async fn pre_match_handler(
    State(state): State<Arc<AppState>>,
    form: Result<Json<PreMatchForm>, JsonRejection>,
) -> Result<Json<ResultView>, DashboardError> {
    let Json(form) = form?;
    let req = form.into_request()?;
    let resp = state
        .client
        .predict_pre_match(&req)
        .await
        .map_err(|source| DashboardError::Transport {
            base_url: state.client.base_url().to_string(),
            source,
        })?;
    info!(
        "Pre-match prediction: p={:.4} winner={}",
        resp.prediction_probability, resp.prediction_winner
    );
    Ok(Json(render_pre_match(&resp)))
}

/// POST /api/live_wpa
async fn live_wpa_handler(
    State(state): State<Arc<AppState>>,
    form: Result<Json<LiveForm>, JsonRejection>,
) -> Result<Json<ResultView>, DashboardError> {
    let Json(form) = form?;
    let req = form.into_request()?;
    let resp = state
        .client
        .predict_live_wpa(&req)
        .await
        .map_err(|source| DashboardError::Transport {
            base_url: state.client.base_url().to_string(),
            source,
        })?;
    info!("Live WPA prediction: p={:.4}", resp.win_probability);
    Ok(Json(render_live(&resp)))
}

/// Embedded single-file dashboard (HTML + CSS + JS)
const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>CricPulse Prediction Dashboard</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #6c63ff;
    --green: #00c896;
    --red: #ff4f6a;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; display: grid; grid-template-columns: 260px 1fr; min-height: 100vh; }
  aside { border-right: 1px solid var(--border); padding: 1.5rem 1.2rem; }
  aside h2 { font-size: 1rem; margin-bottom: 1rem; }
  aside select { width: 100%; padding: .5rem; background: var(--card); color: var(--text); border: 1px solid var(--border); border-radius: 6px; }
  aside .api { margin-top: 1.5rem; color: var(--muted); font-size: .75rem; word-break: break-all; }
  main { padding: 1.5rem 2rem; display: grid; gap: 1.2rem; align-content: start; max-width: 760px; }
  h1 { font-size: 1.5rem; }
  .caption { color: var(--muted); font-size: .85rem; }
  .panel { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1.2rem; display: grid; gap: 1rem; }
  .panel h3 { font-size: .95rem; }
  label { display: grid; gap: .35rem; font-size: .85rem; }
  label .val { color: var(--accent); font-weight: 700; }
  input[type=number] { padding: .45rem; background: var(--bg); color: var(--text); border: 1px solid var(--border); border-radius: 6px; }
  .radio { display: flex; gap: 1rem; }
  button { padding: .6rem 1rem; background: var(--accent); color: #fff; border: none; border-radius: 6px; font-weight: 700; cursor: pointer; justify-self: start; }
  .result.success { border-color: var(--green); }
  .result.error { border-color: var(--red); }
  .result .headline { font-size: 1.6rem; font-weight: 700; }
  .result.success .headline { color: var(--green); }
  .result.error .headline { color: var(--red); }
  .result .detail { color: var(--muted); }
  pre { background: var(--bg); padding: .7rem; border-radius: 6px; white-space: pre-wrap; font-size: .8rem; }
  .hidden { display: none; }
</style>
</head>
<body>
<aside>
  <h2>Modules</h2>
  <select id="module">
    <option value="pre_match">Pre-Match Analysis</option>
    <option value="live">Live Match Win Probability (WPA)</option>
  </select>
  <div class="api" id="api-url"></div>
</aside>
<main>
  <section id="pre_match-page">
    <h1>Pre-Match Prediction Engine</h1>
    <p class="caption">Inputs are differentials (Team 1 value minus Team 2 value).</p>
    <form class="panel" id="pre_match-form">
      <h3>Match Features</h3>
      <div id="pre_match-inputs"></div>
      <div>
        <label>Toss Winner's Choice</label>
        <div class="radio" id="toss-options"></div>
      </div>
      <button type="submit">Get Prediction</button>
    </form>
  </section>
  <section id="live-page" class="hidden">
    <h1>Live Match Win Probability (WPA)</h1>
    <p class="caption">Tracks the chasing team's probability after every ball in the 2nd innings.</p>
    <form class="panel" id="live-form">
      <h3>Current Game State (2nd Innings)</h3>
      <div id="live-inputs"></div>
      <button type="submit">Get Live WPA</button>
    </form>
  </section>
  <section class="panel result hidden" id="result">
    <h3 id="result-title"></h3>
    <div class="headline" id="result-headline"></div>
    <div class="detail" id="result-detail"></div>
    <pre id="result-error" class="hidden"></pre>
  </section>
</main>
<script>
const apiBase = document.body.dataset.api;
document.getElementById('api-url').textContent = 'API: ' + apiBase;

function inputRow(spec) {
  const id = 'in-' + spec.field;
  const max = spec.max != null ? `max="${spec.max}"` : '';
  if (spec.widget === 'slider') {
    return `<label for="${id}">${spec.label} <span class="val" id="${id}-val">${spec.default}</span>
      <input type="range" id="${id}" name="${spec.field}" min="${spec.min}" ${max} step="${spec.step}" value="${spec.default}"
        oninput="document.getElementById('${id}-val').textContent=this.value"></label>`;
  }
  return `<label for="${id}">${spec.label}
    <input type="number" id="${id}" name="${spec.field}" min="${spec.min}" ${max} step="${spec.step}" value="${spec.default}" required></label>`;
}

function collect(form, specs) {
  const data = {};
  specs.forEach(s => { data[s.field] = Number(form.elements[s.field].value); });
  return data;
}

function showResult(view) {
  const box = document.getElementById('result');
  box.className = 'panel result ' + view.tone;
  document.getElementById('result-title').textContent = view.title;
  document.getElementById('result-headline').textContent = view.headline;
  document.getElementById('result-detail').textContent = view.detail || '';
  document.getElementById('result-error').className = 'hidden';
}

function showError(err) {
  const box = document.getElementById('result');
  box.className = 'panel result error';
  document.getElementById('result-title').textContent = 'Error';
  document.getElementById('result-headline').textContent = err.error || 'Request failed';
  document.getElementById('result-detail').textContent = '';
  const pre = document.getElementById('result-error');
  if (err.details) {
    pre.textContent = 'Endpoint: ' + err.endpoint + '\nDetails: ' + err.details;
    pre.className = '';
  } else {
    pre.className = 'hidden';
  }
}

async function submit(path, payload) {
  try {
    const r = await fetch(path, { method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify(payload) });
    const body = await r.json();
    if (r.ok) showResult(body); else showError(body);
  } catch (e) {
    showError({ error: 'Dashboard unreachable', details: String(e), endpoint: path });
  }
}

async function init() {
  const r = await fetch('/api/config');
  if (!r.ok) return;
  const cfg = await r.json();
  document.getElementById('pre_match-inputs').innerHTML = cfg.pre_match.inputs.map(inputRow).join('');
  document.getElementById('live-inputs').innerHTML = cfg.live.inputs.map(inputRow).join('');
  document.getElementById('toss-options').innerHTML = cfg.pre_match.toss_options.map((t, i) =>
    `<label><input type="radio" name="toss_decision" value="${t}" ${i === 0 ? 'checked' : ''}> ${t}</label>`).join('');

  document.getElementById('pre_match-form').addEventListener('submit', ev => {
    ev.preventDefault();
    const payload = collect(ev.target, cfg.pre_match.inputs);
    payload.toss_decision = ev.target.elements['toss_decision'].value;
    submit('/api/pre_match', payload);
  });
  document.getElementById('live-form').addEventListener('submit', ev => {
    ev.preventDefault();
    submit('/api/live_wpa', collect(ev.target, cfg.live.inputs));
  });
}

document.getElementById('module').addEventListener('change', ev => {
  const live = ev.target.value === 'live';
  document.getElementById('pre_match-page').className = live ? 'hidden' : '';
  document.getElementById('live-page').className = live ? '' : 'hidden';
  document.getElementById('result').className = 'panel result hidden';
});

init();
</script>
</body>
</html>"#;
