use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod accounts;
mod authz;
mod convert;
mod families;
mod forecasts;
mod server;
mod statistics;
mod transactions;
mod user;

pub enum ServerError {
    Engine(EngineError),
    /// The caller is authenticated but not allowed to touch the resource.
    Forbidden,
    /// Policy check: the expense/transfer would overdraw the account. This
    /// lives in the API layer on purpose; the engine itself accepts negative
    /// balances so corrective entries are never blocked.
    InsufficientFunds,
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidTransfer(_)
        | EngineError::InvalidRecurrence(_)
        | EngineError::CurrencyMismatch(_)
        | EngineError::InvalidId(_)
        | EngineError::InvalidCursor(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string()),
            ServerError::InsufficientFunds => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient funds".to_string(),
            ),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
