use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Transaction, TransactionKind, TransferCmd};

use super::super::super::{Engine, with_tx};
use super::super::helpers::normalize_tx_meta;

impl Engine {
    /// Create a transfer transaction (debits the source account, credits the
    /// destination by the same amount).
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<Uuid> {
        if cmd.from_account_id == cmd.to_account_id {
            return Err(EngineError::InvalidTransfer(
                "from_account_id and to_account_id must differ".to_string(),
            ));
        }
        let (category, note) = normalize_tx_meta(&cmd.meta);
        with_tx!(self, |db_tx| {
            self.require_transfer_currencies(&db_tx, cmd.from_account_id, cmd.to_account_id)
                .await?;

            let tx = Transaction::new(
                cmd.user_id,
                cmd.from_account_id,
                Some(cmd.to_account_id),
                TransactionKind::Transfer,
                cmd.amount_minor,
                category,
                note,
                cmd.meta.occurred_on,
                cmd.meta.recurrence,
            )?;
            self.create_transaction_with_effects(&db_tx, &tx).await
        })
    }
}
