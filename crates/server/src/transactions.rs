//! Transactions API endpoints

use api_types::transaction::{
    ExpenseNew, IncomeNew, OccurrencesQuery, OccurrencesResponse, RecurrencePatch,
    TransactionCreated, TransactionList, TransactionListResponse, TransactionUpdate,
    TransactionView, TransferNew,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use engine::{
    ExpenseCmd, IncomeCmd, TransactionListFilter, TransferCmd, TxMeta, UpdateTransactionCmd,
    users,
};

use crate::{
    ServerError,
    authz::{Access, ensure_sufficient_funds, require_account_access, require_family_member},
    convert::{map_kind_in, map_recurrence_in, map_transaction},
    server::ServerState,
};

fn meta_from(
    occurred_on: chrono::NaiveDate,
    category: Option<String>,
    note: Option<String>,
    recurrence: Option<api_types::transaction::RecurrenceView>,
) -> TxMeta {
    let mut meta = TxMeta::new(occurred_on);
    meta.category = category;
    meta.note = note;
    meta.recurrence = recurrence.map(map_recurrence_in);
    meta
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let engine = &state.engine;

    let limit = payload.limit.unwrap_or(50);
    let filter = TransactionListFilter {
        from: payload.from,
        to: payload.to,
        kinds: payload
            .kinds
            .map(|kinds| kinds.into_iter().map(map_kind_in).collect()),
        recurring: payload.recurring,
    };

    let (txs, next_cursor) = match (payload.account_id, payload.family_id) {
        (Some(account_id), None) => {
            require_account_access(&state, &user, account_id, Access::Read).await?;
            engine
                .list_transactions_for_account_page(
                    account_id,
                    limit,
                    payload.cursor.as_deref(),
                    &filter,
                )
                .await?
        }
        (None, Some(family_id)) => {
            require_family_member(&state, &user, family_id).await?;
            engine
                .list_transactions_for_family_page(
                    family_id,
                    limit,
                    payload.cursor.as_deref(),
                    &filter,
                )
                .await?
        }
        (None, None) => {
            engine
                .list_transactions_for_user_page(
                    &user.username,
                    limit,
                    payload.cursor.as_deref(),
                    &filter,
                )
                .await?
        }
        (Some(_), Some(_)) => {
            return Err(ServerError::Generic(
                "provide only one of account_id or family_id".to_string(),
            ));
        }
    };

    let transactions: Vec<TransactionView> = txs.into_iter().map(map_transaction).collect();

    Ok(Json(TransactionListResponse {
        transactions,
        next_cursor,
    }))
}

pub async fn get_detail(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(id).await?;
    require_account_access(&state, &user, tx.account_id, Access::Read).await?;
    Ok(Json(map_transaction(tx)))
}

pub async fn income_new(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<IncomeNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    require_account_access(&state, &user, payload.account_id, Access::Write).await?;

    let id = state
        .engine
        .income(IncomeCmd {
            user_id: user.username.clone(),
            account_id: payload.account_id,
            amount_minor: payload.amount_minor,
            meta: meta_from(
                payload.occurred_on,
                payload.category,
                payload.note,
                payload.recurrence,
            ),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionCreated { id })))
}

pub async fn expense_new(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    let account =
        require_account_access(&state, &user, payload.account_id, Access::Write).await?;
    ensure_sufficient_funds(&account, payload.amount_minor, &user)?;

    let id = state
        .engine
        .expense(ExpenseCmd {
            user_id: user.username.clone(),
            account_id: payload.account_id,
            amount_minor: payload.amount_minor,
            meta: meta_from(
                payload.occurred_on,
                payload.category,
                payload.note,
                payload.recurrence,
            ),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionCreated { id })))
}

pub async fn transfer_new(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    let source =
        require_account_access(&state, &user, payload.from_account_id, Access::Write).await?;
    require_account_access(&state, &user, payload.to_account_id, Access::Write).await?;
    ensure_sufficient_funds(&source, payload.amount_minor, &user)?;

    let id = state
        .engine
        .transfer(TransferCmd {
            user_id: user.username.clone(),
            from_account_id: payload.from_account_id,
            to_account_id: payload.to_account_id,
            amount_minor: payload.amount_minor,
            meta: meta_from(payload.occurred_on, None, payload.note, payload.recurrence),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionCreated { id })))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    // Write access is required on every account the edit touches: the
    // original ones (whose balances get the undo pass) and any retarget.
    let original = state.engine.transaction(id).await?;
    require_account_access(&state, &user, original.account_id, Access::Write).await?;
    if let Some(dest) = original.dest_account_id {
        require_account_access(&state, &user, dest, Access::Write).await?;
    }
    if let Some(new_account) = payload.account_id
        && new_account != original.account_id
    {
        require_account_access(&state, &user, new_account, Access::Write).await?;
    }
    if let Some(new_dest) = payload.dest_account_id
        && original.dest_account_id != Some(new_dest)
    {
        require_account_access(&state, &user, new_dest, Access::Write).await?;
    }

    let cmd = UpdateTransactionCmd {
        transaction_id: id,
        amount_minor: payload.amount_minor,
        kind: payload.kind.map(map_kind_in),
        account_id: payload.account_id,
        dest_account_id: payload.dest_account_id,
        category: payload.category,
        note: payload.note,
        occurred_on: payload.occurred_on,
        recurrence: payload.recurrence.map(|patch| match patch {
            RecurrencePatch::Clear => engine::RecurrencePatch::Clear,
            RecurrencePatch::Set(view) => engine::RecurrencePatch::Set(map_recurrence_in(view)),
        }),
    };

    let updated = state.engine.update_transaction(cmd).await?;
    Ok(Json(map_transaction(updated)))
}

pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    let tx = state.engine.transaction(id).await?;
    require_account_access(&state, &user, tx.account_id, Access::Write).await?;
    if let Some(dest) = tx.dest_account_id {
        require_account_access(&state, &user, dest, Access::Write).await?;
    }

    state.engine.delete_transaction(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn occurrences(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Query(query): Query<OccurrencesQuery>,
) -> Result<Json<OccurrencesResponse>, ServerError> {
    let tx = state.engine.transaction(id).await?;
    require_account_access(&state, &user, tx.account_id, Access::Read).await?;

    let dates = state.engine.occurrences(id, query.from, query.to).await?;
    Ok(Json(OccurrencesResponse { dates }))
}
