use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    EngineError, Recurrence, RecurrencePatch, ResultEngine, TransactionKind, TxMeta,
};

use super::super::normalize_optional_text;

pub(super) fn normalize_tx_meta(meta: &TxMeta) -> (Option<String>, Option<String>) {
    (
        normalize_optional_text(meta.category.as_deref()),
        normalize_optional_text(meta.note.as_deref()),
    )
}

pub(super) fn apply_optional_text_patch(
    existing: Option<String>,
    patch: Option<&str>,
) -> Option<String> {
    match patch {
        None => existing,
        Some(value) => normalize_optional_text(Some(value)),
    }
}

pub(super) fn apply_optional_date_patch(
    existing: NaiveDate,
    patch: Option<NaiveDate>,
) -> NaiveDate {
    patch.unwrap_or(existing)
}

pub(super) fn apply_recurrence_patch(
    existing: Option<Recurrence>,
    patch: Option<RecurrencePatch>,
) -> Option<Recurrence> {
    match patch {
        None => existing,
        Some(RecurrencePatch::Clear) => None,
        Some(RecurrencePatch::Set(recurrence)) => Some(recurrence),
    }
}

/// Resolves the destination account of a patched transaction.
///
/// The destination must end up present for transfers and absent for
/// everything else, whatever combination of kind/destination the patch
/// carries.
pub(super) fn resolve_patched_destination(
    new_kind: TransactionKind,
    patch_dest: Option<Uuid>,
    old_kind: TransactionKind,
    old_dest: Option<Uuid>,
) -> ResultEngine<Option<Uuid>> {
    match new_kind {
        TransactionKind::Transfer => {
            let carried = if old_kind == TransactionKind::Transfer {
                old_dest
            } else {
                None
            };
            let dest = patch_dest.or(carried).ok_or_else(|| {
                EngineError::InvalidTransfer("missing destination account".to_string())
            })?;
            Ok(Some(dest))
        }
        TransactionKind::Income | TransactionKind::Expense => {
            if patch_dest.is_some() {
                return Err(EngineError::InvalidTransfer(
                    "destination account is only valid for transfers".to_string(),
                ));
            }
            Ok(None)
        }
    }
}
