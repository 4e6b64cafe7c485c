//! Statistics API endpoints

use api_types::stats::Statistic;
use axum::{Extension, Json, extract::State};

use engine::users;

use crate::{ServerError, server::ServerState};

/// Handle requests for user statistics
pub async fn get_stats(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Statistic>, ServerError> {
    let stats = state.engine.user_statistics(&user.username).await?;

    Ok(Json(Statistic {
        balance_minor: stats.balance_minor,
        total_income_minor: stats.total_income_minor,
        total_expense_minor: stats.total_expense_minor,
    }))
}
