//! Mappings between engine types and wire DTOs.

use api_types::account::AccountKind as ApiAccountKind;
use api_types::family::FamilyRole as ApiFamilyRole;
use api_types::transaction::{
    Frequency as ApiFrequency, RecurrenceView, TransactionKind as ApiKind, TransactionView,
};

pub(crate) fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Income => ApiKind::Income,
        engine::TransactionKind::Expense => ApiKind::Expense,
        engine::TransactionKind::Transfer => ApiKind::Transfer,
    }
}

pub(crate) fn map_kind_in(kind: ApiKind) -> engine::TransactionKind {
    match kind {
        ApiKind::Income => engine::TransactionKind::Income,
        ApiKind::Expense => engine::TransactionKind::Expense,
        ApiKind::Transfer => engine::TransactionKind::Transfer,
    }
}

pub(crate) fn map_currency(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Eur => api_types::Currency::Eur,
        engine::Currency::Usd => api_types::Currency::Usd,
        engine::Currency::Gbp => api_types::Currency::Gbp,
    }
}

pub(crate) fn map_currency_in(currency: api_types::Currency) -> engine::Currency {
    match currency {
        api_types::Currency::Eur => engine::Currency::Eur,
        api_types::Currency::Usd => engine::Currency::Usd,
        api_types::Currency::Gbp => engine::Currency::Gbp,
    }
}

pub(crate) fn map_account_kind(kind: engine::AccountKind) -> ApiAccountKind {
    match kind {
        engine::AccountKind::Checking => ApiAccountKind::Checking,
        engine::AccountKind::Savings => ApiAccountKind::Savings,
        engine::AccountKind::Credit => ApiAccountKind::Credit,
        engine::AccountKind::Loan => ApiAccountKind::Loan,
        engine::AccountKind::Investment => ApiAccountKind::Investment,
    }
}

pub(crate) fn map_account_kind_in(kind: ApiAccountKind) -> engine::AccountKind {
    match kind {
        ApiAccountKind::Checking => engine::AccountKind::Checking,
        ApiAccountKind::Savings => engine::AccountKind::Savings,
        ApiAccountKind::Credit => engine::AccountKind::Credit,
        ApiAccountKind::Loan => engine::AccountKind::Loan,
        ApiAccountKind::Investment => engine::AccountKind::Investment,
    }
}

pub(crate) fn map_role(role: engine::FamilyRole) -> ApiFamilyRole {
    match role {
        engine::FamilyRole::Owner => ApiFamilyRole::Owner,
        engine::FamilyRole::Editor => ApiFamilyRole::Editor,
        engine::FamilyRole::Viewer => ApiFamilyRole::Viewer,
    }
}

pub(crate) fn map_role_in(role: ApiFamilyRole) -> engine::FamilyRole {
    match role {
        ApiFamilyRole::Owner => engine::FamilyRole::Owner,
        ApiFamilyRole::Editor => engine::FamilyRole::Editor,
        ApiFamilyRole::Viewer => engine::FamilyRole::Viewer,
    }
}

pub(crate) fn map_recurrence(recurrence: engine::Recurrence) -> RecurrenceView {
    RecurrenceView {
        frequency: match recurrence.frequency {
            engine::Frequency::Monthly => ApiFrequency::Monthly,
            engine::Frequency::Yearly => ApiFrequency::Yearly,
            engine::Frequency::Custom => ApiFrequency::Custom,
        },
        day_of_month: recurrence.day_of_month,
        every_days: recurrence.every_days,
        until: recurrence.until,
    }
}

pub(crate) fn map_recurrence_in(view: RecurrenceView) -> engine::Recurrence {
    engine::Recurrence {
        frequency: match view.frequency {
            ApiFrequency::Monthly => engine::Frequency::Monthly,
            ApiFrequency::Yearly => engine::Frequency::Yearly,
            ApiFrequency::Custom => engine::Frequency::Custom,
        },
        day_of_month: view.day_of_month,
        every_days: view.every_days,
        until: view.until,
    }
}

pub(crate) fn map_transaction(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        user_id: tx.user_id,
        account_id: tx.account_id,
        dest_account_id: tx.dest_account_id,
        kind: map_kind(tx.kind),
        amount_minor: tx.amount_minor,
        category: tx.category,
        note: tx.note,
        occurred_on: tx.occurred_on,
        recurrence: tx.recurrence.map(map_recurrence),
    }
}
