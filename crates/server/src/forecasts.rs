//! Forecast API endpoints

use api_types::forecast::{ForecastPointView, ForecastQuery, ForecastResponse};
use axum::{Extension, Json, extract::Query, extract::State};
use chrono::Utc;
use uuid::Uuid;

use engine::{ForecastCmd, users};

use crate::{ServerError, server::ServerState};

const MAX_HORIZON_DAYS: u32 = 366;

/// Projects the caller's balances forward.
///
/// Read-only and non-authoritative: the series is recomputed per request and
/// never persisted.
pub async fn get_forecast(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ForecastResponse>, ServerError> {
    let days = query.days.unwrap_or(30);
    if days == 0 || days > MAX_HORIZON_DAYS {
        return Err(ServerError::Generic(format!(
            "days must be within 1-{MAX_HORIZON_DAYS}"
        )));
    }

    let mut cmd = ForecastCmd::new(user.username.clone(), Utc::now().date_naive(), days)
        .include_estimate(query.estimate.unwrap_or(true))
        .sample_every(query.sample.unwrap_or(1));

    if let Some(accounts) = query.accounts.as_deref() {
        let ids = accounts
            .split(',')
            .filter(|part| !part.is_empty())
            .map(|part| {
                Uuid::parse_str(part.trim())
                    .map_err(|_| ServerError::Generic(format!("invalid account id: {part}")))
            })
            .collect::<Result<Vec<Uuid>, ServerError>>()?;
        cmd = cmd.account_ids(ids);
    }

    let points = state
        .engine
        .forecast(cmd)
        .await?
        .into_iter()
        .map(|point| ForecastPointView {
            date: point.date,
            balance_minor: point.balance_minor,
            income_minor: point.income_minor,
            expense_minor: point.expense_minor,
        })
        .collect();

    Ok(Json(ForecastResponse { points }))
}
