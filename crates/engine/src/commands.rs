//! Command structs for engine operations.
//!
//! These types group parameters for write operations
//! (income/expense/transfer/update/forecast), keeping call sites readable and
//! avoiding long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{AccountKind, Currency, Recurrence, TransactionKind};

/// Common metadata for transaction creation.
#[derive(Clone, Debug)]
pub struct TxMeta {
    pub category: Option<String>,
    pub note: Option<String>,
    pub occurred_on: NaiveDate,
    pub recurrence: Option<Recurrence>,
}

impl TxMeta {
    #[must_use]
    pub fn new(occurred_on: NaiveDate) -> Self {
        Self {
            category: None,
            note: None,
            occurred_on,
            recurrence: None,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }
}

/// Generates the shared builder surface of the single-account creation
/// commands (income, expense).
macro_rules! impl_entry_cmd {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name {
            pub user_id: String,
            pub account_id: Uuid,
            pub amount_minor: i64,
            pub meta: TxMeta,
        }

        impl $name {
            #[must_use]
            pub fn new(
                user_id: impl Into<String>,
                account_id: Uuid,
                amount_minor: i64,
                occurred_on: NaiveDate,
            ) -> Self {
                Self {
                    user_id: user_id.into(),
                    account_id,
                    amount_minor,
                    meta: TxMeta::new(occurred_on),
                }
            }

            #[must_use]
            pub fn meta(mut self, meta: TxMeta) -> Self {
                self.meta = meta;
                self
            }

            #[must_use]
            pub fn category(mut self, category: impl Into<String>) -> Self {
                self.meta.category = Some(category.into());
                self
            }

            #[must_use]
            pub fn note(mut self, note: impl Into<String>) -> Self {
                self.meta.note = Some(note.into());
                self
            }

            #[must_use]
            pub fn recurrence(mut self, recurrence: Recurrence) -> Self {
                self.meta.recurrence = Some(recurrence);
                self
            }
        }
    };
}

impl_entry_cmd!(
    /// Create an income transaction (credits the account).
    IncomeCmd
);

impl_entry_cmd!(
    /// Create an expense transaction (debits the account).
    ExpenseCmd
);

/// Create an account-to-account transfer transaction.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub user_id: String,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount_minor: i64,
    pub meta: TxMeta,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount_minor: i64,
        occurred_on: NaiveDate,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            from_account_id,
            to_account_id,
            amount_minor,
            meta: TxMeta::new(occurred_on),
        }
    }

    #[must_use]
    pub fn meta(mut self, meta: TxMeta) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.meta.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn recurrence(mut self, recurrence: Recurrence) -> Self {
        self.meta.recurrence = Some(recurrence);
        self
    }
}

/// Patch for the recurrence template of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecurrencePatch {
    /// Turn the row back into a one-time transaction.
    Clear,
    /// Replace the template.
    Set(Recurrence),
}

/// Update an existing transaction.
///
/// Every field is independently patchable, including the kind and the
/// referenced accounts; the engine undoes the original balance effects and
/// applies the patched record's effects in one atomic pass.
#[derive(Clone, Debug, Default)]
pub struct UpdateTransactionCmd {
    pub transaction_id: Uuid,

    pub amount_minor: Option<i64>,
    pub kind: Option<TransactionKind>,
    pub account_id: Option<Uuid>,
    /// New destination; required when the (possibly patched) kind is
    /// `Transfer` and the original was not.
    pub dest_account_id: Option<Uuid>,
    pub category: Option<String>,
    pub note: Option<String>,
    pub occurred_on: Option<NaiveDate>,
    pub recurrence: Option<RecurrencePatch>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(transaction_id: Uuid) -> Self {
        Self {
            transaction_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn dest_account_id(mut self, dest_account_id: Uuid) -> Self {
        self.dest_account_id = Some(dest_account_id);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn occurred_on(mut self, occurred_on: NaiveDate) -> Self {
        self.occurred_on = Some(occurred_on);
        self
    }

    #[must_use]
    pub fn recurrence(mut self, patch: RecurrencePatch) -> Self {
        self.recurrence = Some(patch);
        self
    }
}

/// Create a new account.
#[derive(Clone, Debug)]
pub struct NewAccountCmd {
    pub user_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub icon: Option<String>,
    pub currency: Currency,
    /// Recorded as an opening income/expense transaction so the balance
    /// invariant holds from the first row.
    pub opening_balance_minor: i64,
    pub opened_on: NaiveDate,
}

impl NewAccountCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        kind: AccountKind,
        opened_on: NaiveDate,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            kind,
            icon: None,
            currency: Currency::default(),
            opening_balance_minor: 0,
            opened_on,
        }
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    #[must_use]
    pub fn opening_balance_minor(mut self, opening_balance_minor: i64) -> Self {
        self.opening_balance_minor = opening_balance_minor;
        self
    }
}

/// Update an account's descriptive fields.
///
/// Balances are never patched directly; they only move through ledger
/// operations.
#[derive(Clone, Debug)]
pub struct UpdateAccountCmd {
    pub account_id: Uuid,
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
    /// `Some("")` clears the icon.
    pub icon: Option<String>,
}

impl UpdateAccountCmd {
    #[must_use]
    pub fn new(account_id: Uuid) -> Self {
        Self {
            account_id,
            name: None,
            kind: None,
            icon: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: AccountKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Project future balances for a user's accounts.
#[derive(Clone, Debug)]
pub struct ForecastCmd {
    pub user_id: String,
    /// Restrict the projection to these accounts; `None` means all of the
    /// user's accounts.
    pub account_ids: Option<Vec<Uuid>>,
    pub today: NaiveDate,
    pub horizon_days: u32,
    /// Blend in the estimated non-recurring expense baseline.
    pub include_estimate: bool,
    /// Restrict the estimate baseline to these categories.
    pub estimate_categories: Option<Vec<String>>,
    /// Emit only every Nth point (the balance still accumulates daily).
    pub sample_every: u32,
}

impl ForecastCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, today: NaiveDate, horizon_days: u32) -> Self {
        Self {
            user_id: user_id.into(),
            account_ids: None,
            today,
            horizon_days,
            include_estimate: true,
            estimate_categories: None,
            sample_every: 1,
        }
    }

    #[must_use]
    pub fn account_ids(mut self, account_ids: Vec<Uuid>) -> Self {
        self.account_ids = Some(account_ids);
        self
    }

    #[must_use]
    pub fn include_estimate(mut self, include_estimate: bool) -> Self {
        self.include_estimate = include_estimate;
        self
    }

    #[must_use]
    pub fn estimate_categories(mut self, categories: Vec<String>) -> Self {
        self.estimate_categories = Some(categories);
        self
    }

    #[must_use]
    pub fn sample_every(mut self, sample_every: u32) -> Self {
        self.sample_every = sample_every;
        self
    }
}
