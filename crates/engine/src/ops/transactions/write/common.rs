use std::collections::HashMap;

use sea_orm::{ActiveValue, DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, accounts,
    transactions,
    util::{ensure_same_currency, model_currency},
};

use super::super::super::Engine;

impl Engine {
    /// Computes the post-update balance of every account touched by a batch
    /// of effect updates.
    ///
    /// Each update is `(account_id, old_delta, new_delta)`: the account loses
    /// `old_delta` (undoing a previously applied effect) and gains
    /// `new_delta`. Creates pass `(account, 0, effect)`, deletions pass
    /// `(account, effect, 0)`, and updates pass both halves so that each
    /// side is computed from a self-consistent record instead of a field
    /// diff.
    ///
    /// Fails with `KeyNotFound` before anything is written if a referenced
    /// account is missing.
    pub(in crate::ops) async fn preview_apply_effects(
        &self,
        db_tx: &DatabaseTransaction,
        updates: &[(Uuid, i64, i64)],
    ) -> ResultEngine<HashMap<Uuid, i64>> {
        let mut new_balances: HashMap<Uuid, i64> = HashMap::new();

        for (account_id, old_delta, new_delta) in updates {
            let model = accounts::Entity::find_by_id(account_id.to_string())
                .one(db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
            let entry = new_balances
                .entry(*account_id)
                .or_insert(model.balance_minor);
            *entry = *entry - *old_delta + *new_delta;
        }

        Ok(new_balances)
    }

    /// Persists the denormalized balances computed by
    /// [`preview_apply_effects`](Self::preview_apply_effects).
    pub(in crate::ops) async fn persist_balances(
        &self,
        db_tx: &DatabaseTransaction,
        new_balances: HashMap<Uuid, i64>,
    ) -> ResultEngine<()> {
        for (account_id, balance_minor) in new_balances {
            let account_model = accounts::ActiveModel {
                id: ActiveValue::Set(account_id.to_string()),
                balance_minor: ActiveValue::Set(balance_minor),
                ..Default::default()
            };
            account_model.update(db_tx).await?;
        }
        Ok(())
    }

    /// Checks that both ends of a transfer carry the same currency label.
    pub(in crate::ops) async fn require_transfer_currencies(
        &self,
        db_tx: &DatabaseTransaction,
        source_id: Uuid,
        dest_id: Uuid,
    ) -> ResultEngine<()> {
        let source = self.require_account(db_tx, source_id).await?;
        let dest = self.require_account(db_tx, dest_id).await?;
        ensure_same_currency(
            model_currency(source.currency.as_str())?,
            model_currency(dest.currency.as_str())?,
        )
    }

    /// Inserts a validated transaction row and applies its balance effects.
    ///
    /// Shared by the public creation commands and by internal writers (e.g.
    /// the opening-balance entry recorded when an account is created).
    pub(in crate::ops) async fn create_transaction_with_effects(
        &self,
        db_tx: &DatabaseTransaction,
        tx: &Transaction,
    ) -> ResultEngine<Uuid> {
        tx.validate()?;
        let effects = tx.balance_effects()?;

        let updates: Vec<(Uuid, i64, i64)> = effects
            .iter()
            .map(|(account_id, delta)| (*account_id, 0, *delta))
            .collect();
        let new_balances = self.preview_apply_effects(db_tx, &updates).await?;

        transactions::ActiveModel::from(tx).insert(db_tx).await?;
        self.persist_balances(db_tx, new_balances).await?;

        Ok(tx.id)
    }
}
