use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use stelfly_assist::{AgentError, AssistantError, IntentError};
use stelfly_core::maintenance::MaintenanceError;
use stelfly_core::slot::SlotError;
use stelfly_sched::coordinator::CoordinatorError;
use stelfly_sched::ledger::LedgerError;

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    /// Valid request, booking rules refuse it (maintenance limits).
    Unprocessable(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::SlotOccupied { .. } => AppError::Conflict(err.to_string()),
            LedgerError::NotFound(_) => AppError::NotFound(err.to_string()),
        }
    }
}

impl From<SlotError> for AppError {
    fn from(err: SlotError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<MaintenanceError> for AppError {
    fn from(err: MaintenanceError) -> Self {
        AppError::Unprocessable(err.to_string())
    }
}

impl From<CoordinatorError> for AppError {
    fn from(err: CoordinatorError) -> Self {
        match err {
            CoordinatorError::Ledger(e) => e.into(),
            CoordinatorError::Slot(e) => e.into(),
            CoordinatorError::UnknownAircraft(_) | CoordinatorError::UnknownInstructor(_) => {
                AppError::Validation(err.to_string())
            }
            CoordinatorError::UnknownBooking(_) => AppError::NotFound(err.to_string()),
            // Half-landed pair: report loudly, never mask as a client error
            CoordinatorError::PartialLinkFailure { .. } => {
                AppError::Internal(anyhow::Error::new(err))
            }
        }
    }
}

impl From<IntentError> for AppError {
    fn from(err: IntentError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<AgentError> for AppError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Intent(e) => e.into(),
            AgentError::Maintenance(e) => e.into(),
            AgentError::Coordinator(e) => e.into(),
        }
    }
}

impl From<AssistantError> for AppError {
    fn from(err: AssistantError) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}
