//! The module contains the `Account` struct and its entity.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Checking,
    Savings,
    Credit,
    Loan,
    Investment,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::Credit => "credit",
            Self::Loan => "loan",
            Self::Investment => "investment",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            "credit" => Ok(Self::Credit),
            "loan" => Ok(Self::Loan),
            "investment" => Ok(Self::Investment),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid account kind: {other}"
            ))),
        }
    }
}

/// An account.
///
/// An account is a representation of a place where money is kept: a bank
/// account, a credit card, a loan, a cash stash. Its `balance_minor` is
/// denormalized: the ledger keeps it equal to the net sum of the effects of
/// every transaction that references the account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier, generated once and persisted so the account can be
    /// renamed without breaking references.
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub icon: Option<String>,
    pub balance_minor: i64,
    pub currency: Currency,
}

impl Account {
    pub fn new(user_id: String, name: String, kind: AccountKind, currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            kind,
            icon: None,
            balance_minor: 0,
            currency,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub kind: String,
    pub icon: Option<String>,
    pub balance_minor: i64,
    pub currency: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            user_id: ActiveValue::Set(account.user_id.clone()),
            name: ActiveValue::Set(account.name.clone()),
            kind: ActiveValue::Set(account.kind.as_str().to_string()),
            icon: ActiveValue::Set(account.icon.clone()),
            balance_minor: ActiveValue::Set(account.balance_minor),
            currency: ActiveValue::Set(account.currency.code().to_string()),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            user_id: model.user_id,
            name: model.name,
            kind: AccountKind::try_from(model.kind.as_str())?,
            icon: model.icon,
            balance_minor: model.balance_minor,
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
        })
    }
}
