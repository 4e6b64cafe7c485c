use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    Account, EngineError, NewAccountCmd, ResultEngine, Transaction, TransactionKind,
    UpdateAccountCmd, accounts, transactions,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Return an account snapshot from DB.
    pub async fn account(&self, account_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            Account::try_from(model)
        })
    }

    /// Lists a user's accounts, ordered by name.
    pub async fn list_accounts(&self, user_id: &str) -> ResultEngine<Vec<Account>> {
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;
            let models = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(accounts::Column::Name)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Account::try_from).collect()
        })
    }

    /// Creates a new account for a user.
    ///
    /// A nonzero `opening_balance_minor` is modeled as an opening transaction
    /// (income when positive, expense when negative) so the balance equals
    /// the sum of ledger effects from the very first row.
    pub async fn new_account(&self, cmd: NewAccountCmd) -> ResultEngine<Uuid> {
        let name = normalize_required_name(&cmd.name, "account")?;
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, &cmd.user_id).await?;

            let exists = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(cmd.user_id.clone()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name.clone()));
            }

            let mut account = Account::new(cmd.user_id.clone(), name.clone(), cmd.kind, cmd.currency);
            account.icon = normalize_optional_text(cmd.icon.as_deref());
            let account_id = account.id;
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;

            if cmd.opening_balance_minor != 0 {
                let kind = if cmd.opening_balance_minor > 0 {
                    TransactionKind::Income
                } else {
                    TransactionKind::Expense
                };
                let tx = Transaction::new(
                    cmd.user_id.clone(),
                    account_id,
                    None,
                    kind,
                    cmd.opening_balance_minor.abs(),
                    Some("opening".to_string()),
                    Some(format!("opening balance for account '{name}'")),
                    cmd.opened_on,
                    None,
                )?;
                self.create_transaction_with_effects(&db_tx, &tx).await?;
            }

            Ok(account_id)
        })
    }

    /// Updates an account's name, kind and/or icon.
    pub async fn update_account(&self, cmd: UpdateAccountCmd) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, cmd.account_id).await?;
            let mut account = Account::try_from(model)?;

            if let Some(name) = cmd.name.as_deref() {
                let name = normalize_required_name(name, "account")?;
                let clash = accounts::Entity::find()
                    .filter(accounts::Column::UserId.eq(account.user_id.clone()))
                    .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                    .filter(accounts::Column::Id.ne(cmd.account_id.to_string()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if clash {
                    return Err(EngineError::ExistingKey(name));
                }
                account.name = name;
            }
            if let Some(kind) = cmd.kind {
                account.kind = kind;
            }
            if let Some(icon) = cmd.icon.as_deref() {
                account.icon = normalize_optional_text(Some(icon));
            }

            accounts::ActiveModel::from(&account).update(&db_tx).await?;
            Ok(account)
        })
    }

    /// Deletes an account.
    ///
    /// Fails with `Conflict` while any transaction still references the
    /// account (as source or destination): silently orphaning history would
    /// break the balance invariant for the other end of transfers.
    pub async fn delete_account(&self, account_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;

            let referenced = transactions::Entity::find()
                .filter(
                    sea_orm::Condition::any()
                        .add(transactions::Column::AccountId.eq(account_id.to_string()))
                        .add(transactions::Column::DestAccountId.eq(account_id.to_string())),
                )
                .one(&db_tx)
                .await?
                .is_some();
            if referenced {
                return Err(EngineError::Conflict(
                    "account still has transactions".to_string(),
                ));
            }

            let account_model = accounts::ActiveModel {
                id: ActiveValue::Set(account_id.to_string()),
                ..Default::default()
            };
            account_model.delete(&db_tx).await?;
            Ok(())
        })
    }
}
