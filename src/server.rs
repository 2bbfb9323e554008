use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::{Json, Router};
use log::{error, info};
use std::sync::Arc;

use crate::config::Config;
use crate::data::{BookingId, TermKey, TimeBlock, WorkloadPolicy};
use crate::detector::detect;
use crate::dto::{
    BookingDto, ConflictReportDto, ProposalRequest, RecommendResponse, RecommendationDto,
    TermQuery,
};
use crate::error::{EngineError, StoreError};
use crate::interval::Minutes;
use crate::recommend::recommend;
use crate::store::ScheduleStore;

/// Shared by every handler.
pub struct AppState {
    pub store: ScheduleStore,
    pub policy: WorkloadPolicy,
    pub blocks: Vec<TimeBlock>,
    pub window_start: Minutes,
    pub window_end: Minutes,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            store: ScheduleStore::new(),
            policy: config.policy.clone(),
            blocks: config.blocks.clone(),
            window_start: config.window_start,
            window_end: config.window_end,
        }
    }
}

pub enum ApiError {
    BadRequest(String),
    Conflict(ConflictReportDto),
    NotFound(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Engine(e) => e.into(),
            StoreError::Rejected(report) => ApiError::Conflict(ConflictReportDto::from(&*report)),
            StoreError::NotFound(id) => ApiError::NotFound(format!("booking {id} not found")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Conflict(report) => (StatusCode::CONFLICT, Json(report)).into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
        }
    }
}

type Shared = State<Arc<AppState>>;

async fn detect_handler(
    State(state): Shared,
    Json(request): Json<ProposalRequest>,
) -> Result<Json<ConflictReportDto>, ApiError> {
    let proposal = request.proposal.to_booking()?;
    let existing = state.store.bookings_for_term(&proposal.term);
    let report = detect(&proposal, &existing, &state.policy)?;
    Ok(Json(ConflictReportDto::from(&report)))
}

async fn recommend_handler(
    State(state): Shared,
    Json(request): Json<ProposalRequest>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let proposal = request.proposal.to_booking()?;
    let existing = state.store.bookings_for_term(&proposal.term);
    let report = detect(&proposal, &existing, &state.policy)?;
    let recommendations = if report.has_time_conflicts() {
        recommend(
            &proposal,
            &existing,
            &state.policy,
            &state.blocks,
            state.window_start,
            state.window_end,
        )?
    } else {
        Vec::new()
    };
    Ok(Json(RecommendResponse {
        report: ConflictReportDto::from(&report),
        recommendations: recommendations.iter().map(RecommendationDto::from).collect(),
    }))
}

async fn list_handler(State(state): Shared, Query(term): Query<TermQuery>) -> Json<Vec<BookingDto>> {
    let term = TermKey::from(term);
    Json(
        state
            .store
            .bookings_for_term(&term)
            .iter()
            .map(BookingDto::from)
            .collect(),
    )
}

async fn commit_handler(
    State(state): Shared,
    Json(request): Json<ProposalRequest>,
) -> Result<(StatusCode, Json<BookingDto>), ApiError> {
    let proposal = request.proposal.to_booking()?;
    let booking = state.store.commit(proposal, &state.policy, request.force)?;
    Ok((StatusCode::CREATED, Json(BookingDto::from(&booking))))
}

async fn update_handler(
    State(state): Shared,
    Path(id): Path<BookingId>,
    Json(request): Json<ProposalRequest>,
) -> Result<Json<BookingDto>, ApiError> {
    let proposal = request.proposal.to_booking()?;
    let booking = state.store.update(id, proposal, &state.policy, request.force)?;
    Ok(Json(BookingDto::from(&booking)))
}

async fn delete_handler(
    State(state): Shared,
    Path(id): Path<BookingId>,
) -> Result<StatusCode, ApiError> {
    state.store.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/schedule/detect", post(detect_handler))
        .route("/v1/schedule/recommend", post(recommend_handler))
        .route("/v1/bookings", post(commit_handler).get(list_handler))
        .route("/v1/bookings/:id", put(update_handler).delete(delete_handler))
        .with_state(state)
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let app = router(Arc::new(AppState::new(&config)));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await.inspect_err(|e| {
        error!("Server stopped: {e}");
    })
}
