use std::collections::HashSet;

use chrono::NaiveDate;
use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ForecastCmd, ResultEngine, Transaction, forecast,
    forecast::{ForecastOptions, ForecastPoint},
    recurrence, transactions,
    util::parse_uuid,
};

use super::{Engine, with_tx};

/// Upper bound on the range of a single occurrence expansion (about five
/// years), so a careless request cannot iterate without limit.
const MAX_OCCURRENCE_RANGE_DAYS: i64 = 1830;

impl Engine {
    /// Projects future balances for a user's accounts.
    ///
    /// Loads the account set and its transaction history, then hands over to
    /// the pure projection in [`forecast`]. Read-only: never writes back.
    pub async fn forecast(&self, cmd: ForecastCmd) -> ResultEngine<Vec<ForecastPoint>> {
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, &cmd.user_id).await?;

            let all_accounts = crate::accounts::Entity::find()
                .filter(crate::accounts::Column::UserId.eq(cmd.user_id.clone()))
                .all(&db_tx)
                .await?;

            let mut account_ids: HashSet<Uuid> = HashSet::new();
            let mut starting_balance_minor = 0i64;
            let requested = cmd.account_ids.as_ref();
            for model in &all_accounts {
                let id = parse_uuid(&model.id, "account")?;
                if let Some(requested) = requested
                    && !requested.contains(&id)
                {
                    continue;
                }
                account_ids.insert(id);
                starting_balance_minor += model.balance_minor;
            }
            if let Some(requested) = requested
                && account_ids.len() != requested.len()
            {
                return Err(EngineError::KeyNotFound("account not exists".to_string()));
            }

            let id_strings: Vec<String> = account_ids.iter().map(|id| id.to_string()).collect();
            let tx_models = transactions::Entity::find()
                .filter(
                    sea_orm::Condition::any()
                        .add(transactions::Column::AccountId.is_in(id_strings.clone()))
                        .add(transactions::Column::DestAccountId.is_in(id_strings)),
                )
                .all(&db_tx)
                .await?;

            let mut history = Vec::with_capacity(tx_models.len());
            for model in tx_models {
                history.push(Transaction::try_from(model)?);
            }

            let options = ForecastOptions {
                horizon_days: cmd.horizon_days,
                include_estimate: cmd.include_estimate,
                estimate_categories: cmd.estimate_categories.clone(),
                sample_every: cmd.sample_every,
            };
            Ok(forecast::project(
                &account_ids,
                starting_balance_minor,
                &history,
                cmd.today,
                &options,
            ))
        })
    }

    /// Expands a recurring transaction template into its occurrence dates in
    /// `[from, to]`.
    ///
    /// Iterates candidate days against the pure predicate; occurrences are
    /// never materialized as rows.
    pub async fn occurrences(
        &self,
        transaction_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ResultEngine<Vec<NaiveDate>> {
        if from > to {
            return Err(EngineError::InvalidAmount(
                "invalid range: from must be <= to".to_string(),
            ));
        }
        if (to - from).num_days() > MAX_OCCURRENCE_RANGE_DAYS {
            return Err(EngineError::InvalidAmount(
                "occurrence range too large".to_string(),
            ));
        }

        let tx = self.transaction(transaction_id).await?;
        let template = tx.recurrence.ok_or_else(|| {
            EngineError::InvalidRecurrence("transaction is not recurring".to_string())
        })?;

        Ok(recurrence::occurrences_in_range(
            &template,
            tx.occurred_on,
            from,
            to,
        ))
    }
}
