use base64::Engine as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, Transaction, TransactionKind, transactions};

use super::super::{Engine, with_tx};

/// Filters for listing transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`).
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// If present, acts as an allow-list of kinds to return.
    pub kinds: Option<Vec<TransactionKind>>,
    /// `Some(true)` returns only recurring templates, `Some(false)` only
    /// one-time transactions.
    pub recurring: Option<bool>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidAmount(
            "invalid range: from must be < to".to_string(),
        ));
    }
    if filter.kinds.as_ref().is_some_and(|k| k.is_empty()) {
        return Err(EngineError::InvalidAmount(
            "kinds must not be empty".to_string(),
        ));
    }
    Ok(())
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::OccurredOn.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::OccurredOn.lt(to));
        }
        if let Some(kinds) = &filter.kinds {
            let kinds: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();
            self = self.filter(transactions::Column::Kind.is_in(kinds));
        }
        if let Some(recurring) = filter.recurring {
            self = self.filter(transactions::Column::IsRecurring.eq(recurring));
        }

        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TransactionsCursor {
    occurred_on: NaiveDate,
    transaction_id: String,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))
    }
}

fn apply_cursor(
    query: sea_orm::Select<transactions::Entity>,
    cursor: Option<&str>,
) -> ResultEngine<sea_orm::Select<transactions::Entity>> {
    let Some(cursor) = cursor else {
        return Ok(query);
    };
    let cursor = TransactionsCursor::decode(cursor)?;
    Ok(query.filter(
        Condition::any()
            .add(transactions::Column::OccurredOn.lt(cursor.occurred_on))
            .add(
                Condition::all()
                    .add(transactions::Column::OccurredOn.eq(cursor.occurred_on))
                    .add(transactions::Column::Id.lt(cursor.transaction_id)),
            ),
    ))
}

fn page_out(
    rows: Vec<transactions::Model>,
    limit: u64,
) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
    let has_more = rows.len() > limit as usize;

    let mut out: Vec<Transaction> = Vec::with_capacity(rows.len().min(limit as usize));
    for model in rows.into_iter().take(limit as usize) {
        out.push(Transaction::try_from(model)?);
    }

    let next_cursor = out.last().map(|tx| TransactionsCursor {
        occurred_on: tx.occurred_on,
        transaction_id: tx.id.to_string(),
    });
    let next_cursor = if has_more {
        next_cursor.map(|c| c.encode()).transpose()?
    } else {
        None
    };

    Ok((out, next_cursor))
}

impl Engine {
    /// Fetch a single transaction by id.
    pub async fn transaction(&self, transaction_id: Uuid) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = transactions::Entity::find_by_id(transaction_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound("transaction not exists".to_string())
                })?;
            Transaction::try_from(model)
        })
    }

    /// Lists transactions recorded by a user, newest first.
    pub async fn list_transactions_for_user(
        &self,
        user_id: &str,
        limit: u64,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        let (items, _next) = self
            .list_transactions_for_user_page(user_id, limit, None, filter)
            .await?;
        Ok(items)
    }

    /// Lists transactions recorded by a user, with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(occurred_on DESC, id DESC)`.
    pub async fn list_transactions_for_user_page(
        &self,
        user_id: &str,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;
            validate_list_filter(filter)?;

            let query = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(transactions::Column::OccurredOn)
                .order_by_desc(transactions::Column::Id)
                .limit(limit.saturating_add(1));
            let query = apply_cursor(query, cursor)?.apply_tx_filters(filter);

            page_out(query.all(&db_tx).await?, limit)
        })
    }

    /// Lists transactions touching an account (as source or destination),
    /// with cursor-based pagination.
    pub async fn list_transactions_for_account_page(
        &self,
        account_id: Uuid,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            validate_list_filter(filter)?;

            let query = transactions::Entity::find()
                .filter(
                    Condition::any()
                        .add(transactions::Column::AccountId.eq(account_id.to_string()))
                        .add(transactions::Column::DestAccountId.eq(account_id.to_string())),
                )
                .order_by_desc(transactions::Column::OccurredOn)
                .order_by_desc(transactions::Column::Id)
                .limit(limit.saturating_add(1));
            let query = apply_cursor(query, cursor)?.apply_tx_filters(filter);

            page_out(query.all(&db_tx).await?, limit)
        })
    }

    /// Lists the union of all family members' transactions, newest first,
    /// with cursor-based pagination.
    pub async fn list_transactions_for_family_page(
        &self,
        family_id: Uuid,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        with_tx!(self, |db_tx| {
            self.require_family(&db_tx, family_id).await?;
            validate_list_filter(filter)?;

            let members = self.member_ids(&db_tx, family_id).await?;
            let query = transactions::Entity::find()
                .filter(transactions::Column::UserId.is_in(members))
                .order_by_desc(transactions::Column::OccurredOn)
                .order_by_desc(transactions::Column::Id)
                .limit(limit.saturating_add(1));
            let query = apply_cursor(query, cursor)?.apply_tx_filters(filter);

            page_out(query.all(&db_tx).await?, limit)
        })
    }
}
