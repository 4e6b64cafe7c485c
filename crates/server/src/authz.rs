//! Authorization policy.
//!
//! The engine is authorization-agnostic, so every access decision is made
//! here before delegating: a caller may act on an account iff they own it,
//! share a family with its owner with a sufficient role, or are an admin.

use uuid::Uuid;

use engine::users;

use crate::{ServerError, server::ServerState};

pub(crate) const ADMIN_ROLE: &str = "admin";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Access {
    Read,
    Write,
}

pub(crate) fn is_admin(user: &users::Model) -> bool {
    user.role == ADMIN_ROLE
}

/// Checks the caller's access to an account and returns it.
pub(crate) async fn require_account_access(
    state: &ServerState,
    user: &users::Model,
    account_id: Uuid,
    access: Access,
) -> Result<engine::Account, ServerError> {
    let account = state.engine.account(account_id).await?;
    if account.user_id == user.username || is_admin(user) {
        return Ok(account);
    }

    let role = state
        .engine
        .shared_family_role(&account.user_id, &user.username)
        .await?;
    match role {
        Some(role) if access == Access::Read || role.can_write() => Ok(account),
        _ => Err(ServerError::Forbidden),
    }
}

/// Policy check applied before creating an expense or transfer: the source
/// account must cover the amount. Admins bypass it so corrective entries are
/// never blocked; the engine itself accepts negative balances either way.
pub(crate) fn ensure_sufficient_funds(
    account: &engine::Account,
    amount_minor: i64,
    user: &users::Model,
) -> Result<(), ServerError> {
    if is_admin(user) {
        return Ok(());
    }
    if account.balance_minor < amount_minor {
        return Err(ServerError::InsufficientFunds);
    }
    Ok(())
}

/// Checks that the caller belongs to the family (admins always pass).
pub(crate) async fn require_family_member(
    state: &ServerState,
    user: &users::Model,
    family_id: Uuid,
) -> Result<(), ServerError> {
    if is_admin(user) {
        return Ok(());
    }
    state
        .engine
        .family_role(family_id, &user.username)
        .await?
        .map(|_| ())
        .ok_or(ServerError::Forbidden)
}

/// Checks that the caller owns the family (admins always pass).
pub(crate) async fn require_family_owner(
    state: &ServerState,
    user: &users::Model,
    family_id: Uuid,
) -> Result<(), ServerError> {
    if is_admin(user) {
        return Ok(());
    }
    match state.engine.family_role(family_id, &user.username).await? {
        Some(engine::FamilyRole::Owner) => Ok(()),
        Some(_) => Err(ServerError::Forbidden),
        None => Err(ServerError::Forbidden),
    }
}
