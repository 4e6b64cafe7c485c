use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{ExpenseCmd, IncomeCmd, ResultEngine, Transaction, TransactionKind, TxMeta};

use super::super::super::{Engine, with_tx};
use super::super::helpers::normalize_tx_meta;

/// Generates a single-account transaction method (income, expense).
macro_rules! impl_entry_tx {
    ($(#[$meta:meta])* $fn_name:ident, $cmd_type:ty, $kind:expr) => {
        $(#[$meta])*
        pub async fn $fn_name(&self, cmd: $cmd_type) -> ResultEngine<Uuid> {
            self.create_entry_transaction(cmd.user_id, cmd.account_id, cmd.amount_minor, cmd.meta, $kind)
                .await
        }
    };
}

impl Engine {
    impl_entry_tx!(
        /// Create an income transaction (credits the source account).
        income,
        IncomeCmd,
        TransactionKind::Income
    );

    impl_entry_tx!(
        /// Create an expense transaction (debits the source account).
        ///
        /// The engine applies the effect unconditionally; whether the account
        /// may go overdrawn is a policy decision made by the caller *before*
        /// invoking this, so corrective entries are never blocked here.
        expense,
        ExpenseCmd,
        TransactionKind::Expense
    );

    async fn create_entry_transaction(
        &self,
        user_id: String,
        account_id: Uuid,
        amount_minor: i64,
        meta: TxMeta,
        kind: TransactionKind,
    ) -> ResultEngine<Uuid> {
        let (category, note) = normalize_tx_meta(&meta);
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;

            let tx = Transaction::new(
                user_id,
                account_id,
                None,
                kind,
                amount_minor,
                category,
                note,
                meta.occurred_on,
                meta.recurrence,
            )?;
            self.create_transaction_with_effects(&db_tx, &tx).await
        })
    }
}
