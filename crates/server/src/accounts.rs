//! Account API endpoints

use api_types::account::{
    AccountCreated, AccountNew, AccountUpdate, AccountView, AccountsResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use engine::{NewAccountCmd, UpdateAccountCmd, users};

use crate::{
    ServerError,
    authz::{Access, require_account_access},
    convert::{map_account_kind, map_account_kind_in, map_currency, map_currency_in},
    server::ServerState,
};

fn view(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        user_id: account.user_id,
        name: account.name,
        kind: map_account_kind(account.kind),
        icon: account.icon,
        balance_minor: account.balance_minor,
        currency: map_currency(account.currency),
    }
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountCreated>), ServerError> {
    let mut cmd = NewAccountCmd::new(
        user.username.clone(),
        payload.name,
        map_account_kind_in(payload.kind),
        Utc::now().date_naive(),
    )
    .opening_balance_minor(payload.opening_balance_minor.unwrap_or(0));
    if let Some(icon) = payload.icon {
        cmd = cmd.icon(icon);
    }
    if let Some(currency) = payload.currency {
        cmd = cmd.currency(map_currency_in(currency));
    }

    let id = state.engine.new_account(cmd).await?;
    Ok((StatusCode::CREATED, Json(AccountCreated { id })))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<AccountsResponse>, ServerError> {
    let accounts = state
        .engine
        .list_accounts(&user.username)
        .await?
        .into_iter()
        .map(view)
        .collect();
    Ok(Json(AccountsResponse { accounts }))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<AccountView>, ServerError> {
    require_account_access(&state, &user, id, Access::Write).await?;

    let mut cmd = UpdateAccountCmd::new(id);
    if let Some(name) = payload.name {
        cmd = cmd.name(name);
    }
    if let Some(kind) = payload.kind {
        cmd = cmd.kind(map_account_kind_in(kind));
    }
    if let Some(icon) = payload.icon {
        cmd = cmd.icon(icon);
    }

    let account = state.engine.update_account(cmd).await?;
    Ok(Json(view(account)))
}

pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    require_account_access(&state, &user, id, Access::Write).await?;
    state.engine.delete_account(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rebuilds the caller's denormalized balances from the transaction log.
pub async fn recompute(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.recompute_balances(&user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
