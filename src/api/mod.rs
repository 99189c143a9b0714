mod payload;

use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::{ForecastDefaults, ServerConfig};
use crate::core::{
    MonthlyProjection, ProjectionEngine, ProjectionError, YearlyProjection, aggregate_yearly,
};

pub use payload::ForecastPayload;

const DEFAULT_SCENARIO_ID: &str = "default";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("months must be between 1 and {max}, got {requested}")]
    InvalidMonths { requested: u32, max: u32 },
    #[error("Invalid JSON payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self, "rejected forecast request");
        error_response(StatusCode::BAD_REQUEST, &self.to_string())
    }
}

#[derive(Clone)]
struct AppState {
    defaults: Arc<ForecastDefaults>,
}

#[derive(Debug, Default, Deserialize)]
struct ForecastQuery {
    months: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub scenario_id: &'static str,
    pub months: Vec<MonthlyProjection>,
}

#[derive(Debug, Serialize)]
pub struct YearlyForecastResponse {
    pub scenario_id: &'static str,
    pub years: Vec<YearlyProjection>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn resolve_months(defaults: &ForecastDefaults, requested: Option<u32>) -> Result<u32, ApiError> {
    let months = requested.unwrap_or(defaults.default_months);
    if months == 0 || months > defaults.max_months {
        return Err(ApiError::InvalidMonths {
            requested: months,
            max: defaults.max_months,
        });
    }
    Ok(months)
}

/// Validates the request and projects `months` months from zero balances.
pub fn run_forecast(
    defaults: &ForecastDefaults,
    months: Option<u32>,
    payload: ForecastPayload,
) -> Result<Vec<MonthlyProjection>, ApiError> {
    let months = resolve_months(defaults, months)?;
    let engine = ProjectionEngine::new(payload.into_assumptions(&defaults.base_currency))?;
    Ok(engine.project_period(months, None))
}

/// Runs a forecast from a raw JSON request body and renders the response
/// body, as the HTTP routes would.
pub fn forecast_json(
    defaults: &ForecastDefaults,
    months: Option<u32>,
    body: &str,
    yearly: bool,
) -> Result<String, ApiError> {
    let payload = serde_json::from_str::<ForecastPayload>(body)?;
    let months = run_forecast(defaults, months, payload)?;
    let rendered = if yearly {
        serde_json::to_string_pretty(&YearlyForecastResponse {
            scenario_id: DEFAULT_SCENARIO_ID,
            years: aggregate_yearly(&months),
        })?
    } else {
        serde_json::to_string_pretty(&ForecastResponse {
            scenario_id: DEFAULT_SCENARIO_ID,
            months,
        })?
    };
    Ok(rendered)
}

pub fn router(defaults: ForecastDefaults) -> Router {
    let state = AppState {
        defaults: Arc::new(defaults),
    };
    Router::new()
        .route("/health", get(health_handler))
        .route("/forecast", post(forecast_handler))
        .route("/forecast/yearly", post(yearly_forecast_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let addr = config.socket_addr();
    let app = router(config.forecast);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "forecast API listening");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn forecast_handler(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
    Json(payload): Json<ForecastPayload>,
) -> Response {
    match run_forecast(&state.defaults, query.months, payload) {
        Ok(months) => {
            info!(months = months.len(), "forecast computed");
            json_response(
                StatusCode::OK,
                ForecastResponse {
                    scenario_id: DEFAULT_SCENARIO_ID,
                    months,
                },
            )
        }
        Err(err) => err.into_response(),
    }
}

async fn yearly_forecast_handler(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
    Json(payload): Json<ForecastPayload>,
) -> Response {
    match run_forecast(&state.defaults, query.months, payload) {
        Ok(months) => {
            let years = aggregate_yearly(&months);
            info!(months = months.len(), years = years.len(), "yearly forecast computed");
            json_response(
                StatusCode::OK,
                YearlyForecastResponse {
                    scenario_id: DEFAULT_SCENARIO_ID,
                    years,
                },
            )
        }
        Err(err) => err.into_response(),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
