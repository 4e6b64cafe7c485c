//! Transaction primitives.
//!
//! A `Transaction` is an atomic event that changes account balances. The
//! direction of the change is derived from [`TransactionKind`]; the stored
//! amount is always a positive magnitude.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Frequency, Recurrence, ResultEngine,
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    /// Who recorded the transaction. Under family sharing this may differ
    /// from the owner of the affected account(s).
    pub user_id: String,
    /// Source account. Incomes credit it, expenses and transfers debit it.
    pub account_id: Uuid,
    /// Destination account; present iff `kind` is `Transfer`.
    pub dest_account_id: Option<Uuid>,
    pub kind: TransactionKind,
    /// Positive magnitude in minor units. The sign is derived from `kind`.
    pub amount_minor: i64,
    pub category: Option<String>,
    pub note: Option<String>,
    /// Calendar date the transaction is effective; also the recurrence
    /// anchor when `recurrence` is set.
    pub occurred_on: NaiveDate,
    pub recurrence: Option<Recurrence>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: String,
        account_id: Uuid,
        dest_account_id: Option<Uuid>,
        kind: TransactionKind,
        amount_minor: i64,
        category: Option<String>,
        note: Option<String>,
        occurred_on: NaiveDate,
        recurrence: Option<Recurrence>,
    ) -> ResultEngine<Self> {
        let tx = Self {
            id: Uuid::new_v4(),
            user_id,
            account_id,
            dest_account_id,
            kind,
            amount_minor,
            category,
            note,
            occurred_on,
            recurrence,
        };
        tx.validate()?;
        Ok(tx)
    }

    /// Validates the amount/kind/recurrence invariants of the record itself.
    /// Referential checks (do the accounts exist?) belong to the ops layer.
    pub fn validate(&self) -> ResultEngine<()> {
        if self.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        match self.kind {
            TransactionKind::Transfer => {
                let dest = self.dest_account_id.ok_or_else(|| {
                    EngineError::InvalidTransfer("missing destination account".to_string())
                })?;
                if dest == self.account_id {
                    return Err(EngineError::InvalidTransfer(
                        "source and destination must differ".to_string(),
                    ));
                }
            }
            TransactionKind::Income | TransactionKind::Expense => {
                if self.dest_account_id.is_some() {
                    return Err(EngineError::InvalidTransfer(
                        "destination account is only valid for transfers".to_string(),
                    ));
                }
            }
        }
        if let Some(recurrence) = &self.recurrence {
            recurrence.validate()?;
        }
        Ok(())
    }

    /// Signed balance changes this transaction applies, as
    /// `(account_id, delta_minor)` pairs.
    ///
    /// Every balance mutation in the engine goes through these effects: the
    /// create path applies them, the delete path applies their negation, and
    /// the update path applies the negation of the old record's effects
    /// followed by the new record's effects.
    pub fn balance_effects(&self) -> ResultEngine<Vec<(Uuid, i64)>> {
        match self.kind {
            TransactionKind::Income => Ok(vec![(self.account_id, self.amount_minor)]),
            TransactionKind::Expense => Ok(vec![(self.account_id, -self.amount_minor)]),
            TransactionKind::Transfer => {
                let dest = self.dest_account_id.ok_or_else(|| {
                    EngineError::InvalidTransfer("missing destination account".to_string())
                })?;
                Ok(vec![
                    (self.account_id, -self.amount_minor),
                    (dest, self.amount_minor),
                ])
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub dest_account_id: Option<String>,
    pub kind: String,
    pub amount_minor: i64,
    pub category: Option<String>,
    pub note: Option<String>,
    pub occurred_on: Date,
    pub is_recurring: bool,
    pub frequency: Option<String>,
    pub frequency_day: Option<i32>,
    pub frequency_every_days: Option<i32>,
    pub recurring_until: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    SourceAccount,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        let recurrence = tx.recurrence.as_ref();
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            dest_account_id: ActiveValue::Set(tx.dest_account_id.map(|id| id.to_string())),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            category: ActiveValue::Set(tx.category.clone()),
            note: ActiveValue::Set(tx.note.clone()),
            occurred_on: ActiveValue::Set(tx.occurred_on),
            is_recurring: ActiveValue::Set(recurrence.is_some()),
            frequency: ActiveValue::Set(recurrence.map(|r| r.frequency.as_str().to_string())),
            frequency_day: ActiveValue::Set(
                recurrence.and_then(|r| r.day_of_month).map(|day| day as i32),
            ),
            frequency_every_days: ActiveValue::Set(
                recurrence.and_then(|r| r.every_days).map(|every| every as i32),
            ),
            recurring_until: ActiveValue::Set(recurrence.and_then(|r| r.until)),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let recurrence = if model.is_recurring {
            let frequency = model.frequency.as_deref().ok_or_else(|| {
                EngineError::InvalidRecurrence("recurring row without frequency".to_string())
            })?;
            Some(Recurrence {
                frequency: Frequency::try_from(frequency)?,
                day_of_month: model.frequency_day.map(|day| day as u32),
                every_days: model.frequency_every_days.map(|every| every as u32),
                until: model.recurring_until,
            })
        } else {
            None
        };

        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            user_id: model.user_id,
            account_id: parse_uuid(&model.account_id, "account")?,
            dest_account_id: parse_optional_uuid(model.dest_account_id.as_deref(), "account")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            category: model.category,
            note: model.note,
            occurred_on: model.occurred_on,
            recurrence,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn transfer_requires_distinct_destination() {
        let account = Uuid::new_v4();
        let missing = Transaction::new(
            "alice".to_string(),
            account,
            None,
            TransactionKind::Transfer,
            100,
            None,
            None,
            date(2025, 1, 1),
            None,
        );
        assert!(matches!(missing, Err(EngineError::InvalidTransfer(_))));

        let same = Transaction::new(
            "alice".to_string(),
            account,
            Some(account),
            TransactionKind::Transfer,
            100,
            None,
            None,
            date(2025, 1, 1),
            None,
        );
        assert!(matches!(same, Err(EngineError::InvalidTransfer(_))));
    }

    #[test]
    fn effects_follow_the_kind() {
        let source = Uuid::new_v4();
        let dest = Uuid::new_v4();

        let income = Transaction::new(
            "alice".to_string(),
            source,
            None,
            TransactionKind::Income,
            250,
            None,
            None,
            date(2025, 1, 1),
            None,
        )
        .unwrap();
        assert_eq!(income.balance_effects().unwrap(), vec![(source, 250)]);

        let transfer = Transaction::new(
            "alice".to_string(),
            source,
            Some(dest),
            TransactionKind::Transfer,
            250,
            None,
            None,
            date(2025, 1, 1),
            None,
        )
        .unwrap();
        let effects = transfer.balance_effects().unwrap();
        assert_eq!(effects, vec![(source, -250), (dest, 250)]);
        // Transfers are zero-sum across the pair.
        assert_eq!(effects.iter().map(|(_, delta)| delta).sum::<i64>(), 0);
    }
}
