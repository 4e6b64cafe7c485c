//! Gruzzolo ledger engine.
//!
//! The engine owns the money data: accounts, the transaction ledger, the
//! recurrence predicates and the balance forecaster. It is the only code
//! path that mutates account balances, and every write commits the
//! transaction row and the affected balances in one database transaction.
//!
//! Authorization is deliberately absent here: the API layer decides who may
//! call what, the engine assumes the caller is allowed to.

pub use accounts::{Account, AccountKind};
pub use commands::{
    ExpenseCmd, ForecastCmd, IncomeCmd, NewAccountCmd, RecurrencePatch, TransferCmd, TxMeta,
    UpdateAccountCmd, UpdateTransactionCmd,
};
pub use currency::Currency;
pub use error::EngineError;
pub use families::Family;
pub use family_memberships::FamilyRole;
pub use forecast::{ForecastOptions, ForecastPoint};
pub use ops::{Engine, EngineBuilder, Statistics, TransactionListFilter};
pub use recurrence::{Frequency, Recurrence};
pub use transactions::{Transaction, TransactionKind};

pub mod accounts;
mod commands;
mod currency;
mod error;
pub mod families;
pub mod family_memberships;
pub mod forecast;
mod ops;
pub mod recurrence;
pub mod transactions;
pub mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
