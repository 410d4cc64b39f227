//! HTTP Lambda serving scenario projections
//!
//! POST `{ "segment": "PF", "algorithm": "Ridge", "params": { ... } }`
//! returns the scenario outcome as JSON. Artifacts are read from
//! `MODELS_DIR` (default `models`) and cached across invocations.

use default_rate_sim::{Algorithm, ScenarioParams, ScenarioRunner, Segment, SimulationError};
use lambda_http::http::{Method, StatusCode};
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use std::sync::OnceLock;

static RUNNER: OnceLock<ScenarioRunner> = OnceLock::new();

fn runner() -> &'static ScenarioRunner {
    RUNNER.get_or_init(|| {
        let dir = std::env::var("MODELS_DIR").unwrap_or_else(|_| "models".to_string());
        info!("serving artifacts from {dir}");
        ScenarioRunner::with_models_dir(dir)
    })
}

#[derive(Debug, Deserialize)]
struct ScenarioRequest {
    segment: Segment,
    #[serde(default)]
    algorithm: Option<Algorithm>,
    #[serde(default)]
    params: ScenarioParams,
}

fn status_for(err: &SimulationError) -> StatusCode {
    match err {
        SimulationError::OutOfRangeInput { .. } | SimulationError::SchemaMismatch { .. } => {
            StatusCode::BAD_REQUEST
        }
        SimulationError::ArtifactMissing { .. } => StatusCode::NOT_FOUND,
        SimulationError::ArtifactInvalid { .. } | SimulationError::PredictionFailure { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn respond(status: StatusCode, body: serde_json::Value) -> Result<Response<Body>, Error> {
    let response = Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))?;
    Ok(response)
}

async fn handler(event: Request) -> Result<Response<Body>, Error> {
    if event.method() != Method::POST {
        return respond(
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "error": "use POST", "kind": "method_not_allowed" }),
        );
    }

    let request: ScenarioRequest = match serde_json::from_slice(event.body().as_ref()) {
        Ok(request) => request,
        Err(err) => {
            return respond(
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("invalid request body: {err}"), "kind": "bad_request" }),
            )
        }
    };

    // Projection is CPU-bound; keep it off the async workers
    let ScenarioRequest { segment, algorithm, params } = request;
    let result =
        tokio::task::spawn_blocking(move || runner().run_segment(segment, algorithm, &params))
            .await?;

    match result {
        Ok(outcome) => respond(StatusCode::OK, serde_json::to_value(&outcome)?),
        Err(err) => {
            error!("{segment} failed: {err}");
            respond(status_for(&err), json!({ "error": err.to_string(), "kind": err.kind() }))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}
