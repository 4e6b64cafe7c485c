use sea_orm::{ConnectionTrait, QueryFilter, Statement, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{ResultEngine, TransactionKind, accounts};

use super::Engine;

/// Summed totals for a user's dashboard.
///
/// Transfers are excluded from income/expense totals: they move money
/// between the user's own accounts without changing the overall position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub balance_minor: i64,
    pub total_income_minor: i64,
    pub total_expense_minor: i64,
}

impl Engine {
    /// Returns summed balance and income/expense totals across a user's
    /// accounts.
    pub async fn user_statistics(&self, user_id: &str) -> ResultEngine<Statistics> {
        let balance_minor: i64 = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.to_string()))
            .all(&self.database)
            .await?
            .iter()
            .map(|account| account.balance_minor)
            .sum();

        let backend = self.database.get_database_backend();
        let mut totals = [0i64; 2];
        for (slot, kind) in totals
            .iter_mut()
            .zip([TransactionKind::Income, TransactionKind::Expense])
        {
            let stmt = Statement::from_sql_and_values(
                backend,
                "SELECT COALESCE(SUM(t.amount_minor), 0) AS total \
                 FROM transactions t \
                 INNER JOIN accounts a ON a.id = t.account_id \
                 WHERE a.user_id = ? AND t.kind = ?",
                vec![user_id.into(), kind.as_str().into()],
            );
            let row = self.database.query_one(stmt).await?;
            *slot = row.and_then(|r| r.try_get("", "total").ok()).unwrap_or(0);
        }

        Ok(Statistics {
            balance_minor,
            total_income_minor: totals[0],
            total_expense_minor: totals[1],
        })
    }
}
