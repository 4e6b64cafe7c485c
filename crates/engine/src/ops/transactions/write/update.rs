use sea_orm::{TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, TransactionKind, UpdateTransactionCmd, transactions,
};

use super::super::super::{Engine, with_tx};
use super::super::helpers::{
    apply_optional_date_patch, apply_optional_text_patch, apply_recurrence_patch,
    resolve_patched_destination,
};

impl Engine {
    /// Updates an existing transaction.
    ///
    /// Every field is independently patchable, including `kind`, the amount
    /// and the referenced accounts. Instead of diffing fields, the engine
    /// undoes the balance effects of the *original* record and applies the
    /// effects of the *patched* record: each pass reads a self-consistent
    /// kind/amount/account triple, so edits that move a transaction between
    /// accounts or change its type stay correct. Both passes and the row
    /// update commit atomically.
    pub async fn update_transaction(
        &self,
        cmd: UpdateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = transactions::Entity::find_by_id(cmd.transaction_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound("transaction not exists".to_string())
                })?;
            let original = Transaction::try_from(model)?;

            let mut updated = original.clone();
            updated.amount_minor = cmd.amount_minor.unwrap_or(original.amount_minor);
            updated.kind = cmd.kind.unwrap_or(original.kind);
            updated.account_id = cmd.account_id.unwrap_or(original.account_id);
            updated.dest_account_id = resolve_patched_destination(
                updated.kind,
                cmd.dest_account_id,
                original.kind,
                original.dest_account_id,
            )?;
            updated.category =
                apply_optional_text_patch(original.category.clone(), cmd.category.as_deref());
            updated.note = apply_optional_text_patch(original.note.clone(), cmd.note.as_deref());
            updated.occurred_on = apply_optional_date_patch(original.occurred_on, cmd.occurred_on);
            updated.recurrence = apply_recurrence_patch(original.recurrence, cmd.recurrence);
            updated.validate()?;

            match updated.kind {
                TransactionKind::Transfer => {
                    if let Some(dest) = updated.dest_account_id {
                        self.require_transfer_currencies(&db_tx, updated.account_id, dest)
                            .await?;
                    }
                }
                TransactionKind::Income | TransactionKind::Expense => {
                    self.require_account(&db_tx, updated.account_id).await?;
                }
            }

            // Undo exactly what the original create applied, then apply the
            // patched record, each on the accounts that record references.
            let mut updates: Vec<(Uuid, i64, i64)> = original
                .balance_effects()?
                .into_iter()
                .map(|(account_id, delta)| (account_id, delta, 0))
                .collect();
            updates.extend(
                updated
                    .balance_effects()?
                    .into_iter()
                    .map(|(account_id, delta)| (account_id, 0, delta)),
            );
            let new_balances = self.preview_apply_effects(&db_tx, &updates).await?;

            transactions::ActiveModel::from(&updated).update(&db_tx).await?;
            self.persist_balances(&db_tx, new_balances).await?;

            Ok(updated)
        })
    }
}
