//! Existence and lookup helpers shared by the ops modules.
//!
//! The engine is authorization-agnostic: nothing here decides whether a
//! caller *may* touch a row, only whether the row exists. The membership
//! lookups are exposed so the API layer can make its own access decisions.

use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, FamilyRole, ResultEngine, accounts, families, family_memberships, users,
};

use super::{Engine, with_tx};

impl Engine {
    pub(super) async fn require_account(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<accounts::Model> {
        accounts::Entity::find_by_id(account_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<()> {
        let exists = users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .is_some();
        if !exists {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }
        Ok(())
    }

    pub(super) async fn require_family(
        &self,
        db: &DatabaseTransaction,
        family_id: Uuid,
    ) -> ResultEngine<families::Model> {
        families::Entity::find_by_id(family_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("family not exists".to_string()))
    }

    pub(super) async fn membership_role(
        &self,
        db: &DatabaseTransaction,
        family_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Option<FamilyRole>> {
        let row = family_memberships::Entity::find_by_id((
            family_id.to_string(),
            user_id.to_string(),
        ))
        .one(db)
        .await?;
        row.as_ref()
            .map(|m| FamilyRole::try_from(m.role.as_str()))
            .transpose()
    }

    pub(super) async fn member_ids(
        &self,
        db: &DatabaseTransaction,
        family_id: Uuid,
    ) -> ResultEngine<Vec<String>> {
        let rows = family_memberships::Entity::find()
            .filter(family_memberships::Column::FamilyId.eq(family_id.to_string()))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|m| m.user_id).collect())
    }

    /// Role of `user_id` in `family_id`, if any.
    pub async fn family_role(
        &self,
        family_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Option<FamilyRole>> {
        with_tx!(self, |db_tx| {
            self.require_family(&db_tx, family_id).await?;
            self.membership_role(&db_tx, family_id, user_id).await
        })
    }

    /// Best role `caller` holds in any family that also contains `owner`.
    ///
    /// This is the primitive the API layer builds family-sharing
    /// authorization on: `None` means the two users share no family.
    pub async fn shared_family_role(
        &self,
        owner: &str,
        caller: &str,
    ) -> ResultEngine<Option<FamilyRole>> {
        with_tx!(self, |db_tx| {
            let caller_rows = family_memberships::Entity::find()
                .filter(family_memberships::Column::UserId.eq(caller.to_string()))
                .all(&db_tx)
                .await?;

            let mut best: Option<FamilyRole> = None;
            for row in caller_rows {
                let owner_in_family = family_memberships::Entity::find_by_id((
                    row.family_id.clone(),
                    owner.to_string(),
                ))
                .one(&db_tx)
                .await?
                .is_some();
                if !owner_in_family {
                    continue;
                }
                let role = FamilyRole::try_from(row.role.as_str())?;
                best = Some(match best {
                    Some(current) if rank(current) >= rank(role) => current,
                    _ => role,
                });
            }
            Ok(best)
        })
    }
}

fn rank(role: FamilyRole) -> u8 {
    match role {
        FamilyRole::Viewer => 0,
        FamilyRole::Editor => 1,
        FamilyRole::Owner => 2,
    }
}
