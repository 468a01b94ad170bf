//! API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<ApiState>`.
//! Simulations are CPU-bound and read squad files, so they run on the
//! blocking pool.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use super::charts::ChartData;
use crate::commentary::{
    comparison_commentary, season_commentary, Commentary, CommentaryGenerator, SeasonSummary,
    StrategyComparison,
};
use crate::data::clubs::ClubRegistry;
use crate::data::SquadSource;
use crate::engine::SimulationRunner;
use crate::types::{season_label, SimError, SimulationRequest, SimulationResult, StrategyMode};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ApiState {
    pub source: Arc<dyn SquadSource>,
    pub registry: ClubRegistry,
    pub runner: SimulationRunner,
    pub analyst: Option<Arc<dyn CommentaryGenerator>>,
}

impl ApiState {
    pub fn new(
        source: Arc<dyn SquadSource>,
        runner: SimulationRunner,
        analyst: Option<Arc<dyn CommentaryGenerator>>,
    ) -> Self {
        Self {
            source,
            registry: ClubRegistry,
            runner,
            analyst,
        }
    }
}

pub type AppState = Arc<ApiState>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Sim(SimError::MissingData { .. }) => StatusCode::NOT_FOUND,
            ApiError::Sim(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SimulateBody {
    pub team_name: String,
    /// Season start year, e.g. 2024 for 2024/25
    pub season: u16,
    pub transfer_budget: Decimal,
    pub salary_budget: Decimal,
    #[serde(default)]
    pub strategy_mode: Option<String>,
}

impl SimulateBody {
    /// Resolve the club and mode into an engine request.
    fn to_request(&self, registry: &ClubRegistry, mode: StrategyMode) -> Result<SimulationRequest, SimError> {
        registry.build_request(
            &self.team_name,
            self.season,
            self.transfer_budget,
            self.salary_budget,
            mode,
        )
    }

    fn mode(&self) -> Result<StrategyMode, SimError> {
        match self.strategy_mode.as_deref() {
            Some(m) => m.parse(),
            None => Ok(StrategyMode::default()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClubListing {
    pub name: &'static str,
    pub league: &'static str,
    pub league_key: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulateResponse {
    pub club: String,
    pub league: String,
    pub season: String,
    pub strategy_mode: StrategyMode,
    pub result: SimulationResult,
    pub chart_data: ChartData,
    #[serde(flatten)]
    pub analysis: Commentary<SeasonSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModeRun {
    pub mode: StrategyMode,
    pub result: SimulationResult,
    pub chart_data: ChartData,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareResponse {
    pub club: String,
    pub league: String,
    pub season: String,
    pub runs: Vec<ModeRun>,
    #[serde(flatten)]
    pub comparison: Commentary<StrategyComparison>,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// Run one simulation on the blocking pool.
async fn run_blocking(state: AppState, request: SimulationRequest) -> Result<SimulationResult, ApiError> {
    tokio::task::spawn_blocking(move || state.runner.run_from_source(state.source.as_ref(), &request))
        .await
        .map_err(|e| ApiError::Internal(format!("Simulation task failed: {e}")))?
        .map_err(ApiError::from)
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/clubs
pub async fn list_clubs(State(state): State<AppState>) -> Json<Vec<ClubListing>> {
    let registry = state.registry;
    Json(
        registry
            .all()
            .iter()
            .map(|c| ClubListing {
                name: c.name,
                league: registry.league_label(c.league),
                league_key: c.league,
            })
            .collect(),
    )
}

/// POST /api/simulate
pub async fn simulate(
    State(state): State<AppState>,
    Json(body): Json<SimulateBody>,
) -> Result<Json<SimulateResponse>, ApiError> {
    let mode = body.mode()?;
    let request = body.to_request(&state.registry, mode)?;

    info!(club = %request.club, season = request.season, mode = %mode, "Simulation requested");

    let result = run_blocking(state.clone(), request).await?;
    let analysis = season_commentary(state.analyst.as_deref(), &result).await;

    Ok(Json(SimulateResponse {
        club: result.request.club.clone(),
        league: state.registry.league_label(&result.request.league).to_string(),
        season: season_label(result.request.season),
        strategy_mode: mode,
        chart_data: ChartData::from_result(&result),
        result,
        analysis,
    }))
}

/// POST /api/compare
pub async fn compare(
    State(state): State<AppState>,
    Json(body): Json<SimulateBody>,
) -> Result<Json<CompareResponse>, ApiError> {
    let requests = StrategyMode::ALL
        .iter()
        .map(|&mode| body.to_request(&state.registry, mode))
        .collect::<Result<Vec<_>, _>>()?;

    info!(club = %requests[0].club, season = requests[0].season, "Comparison requested");

    let results = join_all(requests.into_iter().map(|r| run_blocking(state.clone(), r)))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    let comparison = comparison_commentary(state.analyst.as_deref(), &results).await;
    let first = &results[0].request;
    let (club, league, season) = (
        first.club.clone(),
        state.registry.league_label(&first.league).to_string(),
        season_label(first.season),
    );

    Ok(Json(CompareResponse {
        club,
        league,
        season,
        runs: results
            .into_iter()
            .map(|result| ModeRun {
                mode: result.request.mode,
                chart_data: ChartData::from_result(&result),
                result,
            })
            .collect(),
        comparison,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
