use sea_orm::{TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Transaction, transactions};

use super::super::super::{Engine, with_tx};

impl Engine {
    /// Deletes a transaction and reverses its balance effects.
    ///
    /// The inverse of the stored record's effects is applied to whichever
    /// accounts it references, so a create followed by a delete restores the
    /// affected balances exactly. Hard delete: the row is gone afterwards.
    pub async fn delete_transaction(&self, transaction_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = transactions::Entity::find_by_id(transaction_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound("transaction not exists".to_string())
                })?;
            let original = Transaction::try_from(model)?;

            let updates: Vec<(Uuid, i64, i64)> = original
                .balance_effects()?
                .into_iter()
                .map(|(account_id, delta)| (account_id, delta, 0))
                .collect();
            let new_balances = self.preview_apply_effects(&db_tx, &updates).await?;

            transactions::Entity::delete_by_id(transaction_id.to_string())
                .exec(&db_tx)
                .await?;
            self.persist_balances(&db_tx, new_balances).await?;

            Ok(())
        })
    }
}
