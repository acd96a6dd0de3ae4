//! Admin threshold handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::{AppResult, AppState};
use crate::logic::threshold::format_percent;
use crate::models::{ThresholdResponse, ThresholdUpdated, UpdateThreshold};

/// Current admission threshold
pub async fn get_threshold(State(state): State<AppState>) -> Json<ThresholdResponse> {
    Json(ThresholdResponse::new(state.thresholds.get()))
}

/// Set a new admission threshold (0.0 - 1.0)
pub async fn set_threshold(
    State(state): State<AppState>,
    payload: Result<Json<UpdateThreshold>, JsonRejection>,
) -> AppResult<Json<ThresholdUpdated>> {
    let Json(req) = payload?;
    let previous = state.thresholds.set(req.threshold).await?;

    tracing::info!(
        "Admin: threshold changed from {} to {}",
        format_percent(previous),
        format_percent(req.threshold)
    );

    Ok(Json(ThresholdUpdated::new(req.threshold, previous)))
}
