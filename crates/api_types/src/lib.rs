use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
}

pub mod account {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AccountKind {
        Checking,
        Savings,
        Credit,
        Loan,
        Investment,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
        pub kind: AccountKind,
        pub icon: Option<String>,
        pub currency: Option<Currency>,
        /// Recorded as an opening transaction; may be negative.
        pub opening_balance_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountUpdate {
        pub name: Option<String>,
        pub kind: Option<AccountKind>,
        /// An empty string clears the icon.
        pub icon: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub user_id: String,
        pub name: String,
        pub kind: AccountKind,
        pub icon: Option<String>,
        pub balance_minor: i64,
        pub currency: Currency,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountsResponse {
        pub accounts: Vec<AccountView>,
    }
}

pub mod family {
    use super::*;

    /// Role of a user in a family.
    ///
    /// The server treats roles as:
    /// - `owner`: full access and can manage members.
    /// - `editor`: can write to members' accounts but cannot manage members.
    /// - `viewer`: read-only.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum FamilyRole {
        Owner,
        Editor,
        Viewer,
    }

    impl FamilyRole {
        /// Returns the canonical role string used by the engine/database.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Owner => "owner",
                Self::Editor => "editor",
                Self::Viewer => "viewer",
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FamilyNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FamilyCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FamilyView {
        pub id: Uuid,
        pub name: String,
        pub created_by: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FamiliesResponse {
        pub families: Vec<FamilyView>,
    }

    /// Request body for adding/updating a member.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberUpsert {
        pub username: String,
        pub role: FamilyRole,
    }

    /// Response body for listing members.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }

    /// A member with their role.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub username: String,
        pub role: FamilyRole,
    }
}

pub mod stats {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Statistic {
        pub balance_minor: i64,
        pub total_income_minor: i64,
        pub total_expense_minor: i64,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Me {
        pub username: String,
        pub role: String,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
        Transfer,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Frequency {
        Monthly,
        Yearly,
        Custom,
    }

    /// Recurrence template carried by recurring transactions.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RecurrenceView {
        pub frequency: Frequency,
        /// Day of month (1-31), monthly only.
        pub day_of_month: Option<u32>,
        /// Interval in days, custom only.
        pub every_days: Option<u32>,
        /// Last date (inclusive); absent recurs indefinitely.
        pub until: Option<NaiveDate>,
    }

    /// Filter selector for transaction listings.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionList {
        /// Restrict to one account (source or destination).
        pub account_id: Option<Uuid>,
        /// Union of all member users' transactions.
        pub family_id: Option<Uuid>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        pub kinds: Option<Vec<TransactionKind>>,
        pub recurring: Option<bool>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        ///
        /// Newest → older pagination.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub user_id: String,
        pub account_id: Uuid,
        pub dest_account_id: Option<Uuid>,
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub category: Option<String>,
        pub note: Option<String>,
        pub occurred_on: NaiveDate,
        pub recurrence: Option<RecurrenceView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncomeNew {
        pub account_id: Uuid,
        pub amount_minor: i64,
        pub category: Option<String>,
        pub note: Option<String>,
        pub occurred_on: NaiveDate,
        pub recurrence: Option<RecurrenceView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub account_id: Uuid,
        pub amount_minor: i64,
        pub category: Option<String>,
        pub note: Option<String>,
        pub occurred_on: NaiveDate,
        pub recurrence: Option<RecurrenceView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub from_account_id: Uuid,
        pub to_account_id: Uuid,
        pub amount_minor: i64,
        pub note: Option<String>,
        pub occurred_on: NaiveDate,
        pub recurrence: Option<RecurrenceView>,
    }

    /// Patch for the recurrence template of a transaction.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "op", content = "value", rename_all = "snake_case")]
    pub enum RecurrencePatch {
        /// Turn the row back into a one-time transaction.
        Clear,
        /// Replace the template.
        Set(RecurrenceView),
    }

    /// Patch for an existing transaction. Absent fields stay unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub amount_minor: Option<i64>,
        pub kind: Option<TransactionKind>,
        pub account_id: Option<Uuid>,
        pub dest_account_id: Option<Uuid>,
        pub category: Option<String>,
        pub note: Option<String>,
        pub occurred_on: Option<NaiveDate>,
        pub recurrence: Option<RecurrencePatch>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OccurrencesQuery {
        pub from: NaiveDate,
        pub to: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OccurrencesResponse {
        pub dates: Vec<NaiveDate>,
    }
}

pub mod forecast {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ForecastQuery {
        /// Days to project forward (default 30).
        pub days: Option<u32>,
        /// Comma-separated account ids; absent means all accounts.
        pub accounts: Option<String>,
        /// Blend in the estimated expense baseline (default true).
        pub estimate: Option<bool>,
        /// Emit only every Nth point (default 1).
        pub sample: Option<u32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ForecastPointView {
        pub date: NaiveDate,
        pub balance_minor: i64,
        pub income_minor: i64,
        pub expense_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ForecastResponse {
        pub points: Vec<ForecastPointView>,
    }
}
