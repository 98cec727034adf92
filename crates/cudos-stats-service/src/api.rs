//! Read-only HTTP surface
//!
//! Every handler reads from the [`MetricsCache`] and never talks to the
//! chain. A missing or undecodable key answers `400 Bad Request`.

use crate::cache::{keys, MetricsCache};
use crate::error::{Result, StatsError};
use crate::metrics::StatsMetrics;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use cudos_stats_economics::format_supply;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Static mint parameters echoed by `/cosmos/mint/v1beta1/params`
#[derive(Clone, Debug)]
pub struct MintParams {
    pub mint_denom: String,
    pub blocks_per_year: String,
}

/// Application state
pub struct ApiState {
    pub cache: Arc<MetricsCache>,
    pub mint_params: MintParams,
    /// Served at `/metrics` when present
    pub metrics: Option<Arc<StatsMetrics>>,
}

/// Build the router
pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Cosmos-compatible mint module
        .route("/cosmos/mint/v1beta1/inflation", get(inflation))
        .route("/cosmos/mint/v1beta1/annual_provisions", get(annual_provisions))
        .route("/cosmos/mint/v1beta1/params", get(mint_params))
        // Supply
        .route("/cosmos/bank/v1beta1/supply", get(all_tokens_supply))
        .route("/circulating-supply", get(circulating_supply_text))
        .route("/json/circulating-supply", get(circulating_supply_json))
        .route("/cudos-network-total-supply", get(network_total_supply))
        // Aggregates
        .route("/stats", get(stats))
        // Operations
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .layer(cors)
        .with_state(state)
}

impl IntoResponse for StatsError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

// ============ Response types ============

#[derive(Serialize)]
struct InflationResponse {
    inflation: String,
}

#[derive(Serialize)]
struct AnnualProvisionsResponse {
    annual_provisions: String,
}

#[derive(Serialize)]
struct ParamsResponse {
    params: ParamsBody,
}

#[derive(Serialize)]
struct ParamsBody {
    mint_denom: String,
    inflation_rate_change: &'static str,
    inflation_max: &'static str,
    inflation_min: &'static str,
    goal_bonded: &'static str,
    blocks_per_year: String,
}

#[derive(Serialize)]
struct SupplyResponse {
    supply: String,
}

#[derive(Debug, Serialize)]
struct ValueAtHeight {
    value: String,
    height: i64,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    inflation: ValueAtHeight,
    apr: ValueAtHeight,
    supply: ValueAtHeight,
}

// ============ Handlers ============

async fn inflation(State(state): State<Arc<ApiState>>) -> Result<Json<InflationResponse>> {
    Ok(Json(InflationResponse {
        inflation: state.cache.get(keys::INFLATION)?,
    }))
}

async fn annual_provisions(State(state): State<Arc<ApiState>>) -> Result<Json<AnnualProvisionsResponse>> {
    Ok(Json(AnnualProvisionsResponse {
        annual_provisions: state.cache.get(keys::ANNUAL_PROVISIONS)?,
    }))
}

async fn mint_params(State(state): State<Arc<ApiState>>) -> Json<ParamsResponse> {
    Json(ParamsResponse {
        params: ParamsBody {
            mint_denom: state.mint_params.mint_denom.clone(),
            inflation_rate_change: "0.0",
            inflation_max: "0.0",
            inflation_min: "0.0",
            goal_bonded: "0.0",
            blocks_per_year: state.mint_params.blocks_per_year.clone(),
        },
    })
}

async fn all_tokens_supply(State(state): State<Arc<ApiState>>) -> Result<Response> {
    let blob = state.cache.get(keys::ALL_TOKENS_SUPPLY)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], blob).into_response())
}

async fn circulating_supply_text(State(state): State<Arc<ApiState>>) -> Result<String> {
    Ok(format_supply(&state.cache.get(keys::SUPPLY)?)?)
}

async fn circulating_supply_json(State(state): State<Arc<ApiState>>) -> Result<Json<SupplyResponse>> {
    Ok(Json(SupplyResponse {
        supply: format_supply(&state.cache.get(keys::SUPPLY)?)?,
    }))
}

async fn network_total_supply(State(state): State<Arc<ApiState>>) -> Result<String> {
    Ok(format_supply(&state.cache.get(keys::CUDOS_NETWORK_TOTAL_SUPPLY)?)?)
}

async fn stats(State(state): State<Arc<ApiState>>) -> Result<Json<StatsResponse>> {
    const KEYS: [&str; 6] = [
        keys::INFLATION,
        keys::INFLATION_HEIGHT,
        keys::APR,
        keys::APR_HEIGHT,
        keys::SUPPLY,
        keys::SUPPLY_HEIGHT,
    ];

    // one read lock for all six keys
    let values = state.cache.get_many(&KEYS)?;
    let height = |index: usize| -> Result<i64> {
        values[index].parse().map_err(|_| StatsError::InvalidCachedValue {
            key: KEYS[index].to_string(),
            value: values[index].clone(),
        })
    };

    Ok(Json(StatsResponse {
        inflation: ValueAtHeight {
            value: values[0].clone(),
            height: height(1)?,
        },
        apr: ValueAtHeight {
            value: values[2].clone(),
            height: height(3)?,
        },
        supply: ValueAtHeight {
            value: format_supply(&values[4])?,
            height: height(5)?,
        },
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn prometheus_metrics(State(state): State<Arc<ApiState>>) -> Result<Response> {
    let metrics = state
        .metrics
        .as_ref()
        .ok_or_else(|| StatsError::NotFound("metrics are disabled".to_string()))?;
    let body = metrics.encode()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response())
}
