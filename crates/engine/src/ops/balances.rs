use std::collections::HashMap;

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{ResultEngine, Transaction, accounts, transactions, util::parse_uuid};

use super::{Engine, with_tx};

impl Engine {
    /// Recomputes the denormalized balance of every account a user owns from
    /// the transaction log.
    ///
    /// Replays the effects of all stored transactions touching those
    /// accounts in chronological order. On a consistent ledger this is a
    /// no-op; it exists as a repair/audit tool for the invariant
    /// `balance == sum of applied effects`.
    pub async fn recompute_balances(&self, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;

            let account_models = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id.to_string()))
                .all(&db_tx)
                .await?;

            let mut balances: HashMap<Uuid, i64> = HashMap::new();
            let mut account_ids: Vec<String> = Vec::with_capacity(account_models.len());
            for model in &account_models {
                balances.insert(parse_uuid(&model.id, "account")?, 0);
                account_ids.push(model.id.clone());
            }

            let tx_models = transactions::Entity::find()
                .filter(
                    sea_orm::Condition::any()
                        .add(transactions::Column::AccountId.is_in(account_ids.clone()))
                        .add(transactions::Column::DestAccountId.is_in(account_ids)),
                )
                .order_by_asc(transactions::Column::OccurredOn)
                .order_by_asc(transactions::Column::Id)
                .all(&db_tx)
                .await?;

            for model in tx_models {
                let tx = Transaction::try_from(model)?;
                for (account_id, delta) in tx.balance_effects()? {
                    // Transfers may reference accounts outside this user's
                    // set; only the user's side is recomputed here.
                    if let Some(balance) = balances.get_mut(&account_id) {
                        *balance += delta;
                    }
                }
            }

            let updates: Vec<(Uuid, i64)> = balances.into_iter().collect();
            for (account_id, balance_minor) in updates {
                let account_model = accounts::ActiveModel {
                    id: sea_orm::ActiveValue::Set(account_id.to_string()),
                    balance_minor: sea_orm::ActiveValue::Set(balance_minor),
                    ..Default::default()
                };
                account_model.update(&db_tx).await?;
            }

            Ok(())
        })
    }
}
