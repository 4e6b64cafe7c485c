use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Family, FamilyRole, ResultEngine, families, family_memberships,
};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Creates a family and enrolls its creator as `owner`.
    pub async fn new_family(&self, name: &str, created_by: &str) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "family")?;
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, created_by).await?;

            let family = Family::new(name.clone(), created_by.to_string());
            let family_id = family.id;
            families::ActiveModel::from(&family).insert(&db_tx).await?;

            let membership = family_memberships::ActiveModel {
                family_id: ActiveValue::Set(family_id.to_string()),
                user_id: ActiveValue::Set(created_by.to_string()),
                role: ActiveValue::Set(FamilyRole::Owner.as_str().to_string()),
            };
            membership.insert(&db_tx).await?;

            Ok(family_id)
        })
    }

    /// Adds or updates a family member.
    ///
    /// The creator's `owner` role is immutable; demoting or removing them
    /// would leave the family unmanageable.
    pub async fn upsert_family_member(
        &self,
        family_id: Uuid,
        member_username: &str,
        role: FamilyRole,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let family = self.require_family(&db_tx, family_id).await?;
            self.require_user_exists(&db_tx, member_username).await?;
            if member_username == family.created_by && role != FamilyRole::Owner {
                return Err(EngineError::InvalidAmount(
                    "cannot change the family creator's role".to_string(),
                ));
            }

            let active = family_memberships::ActiveModel {
                family_id: ActiveValue::Set(family_id.to_string()),
                user_id: ActiveValue::Set(member_username.to_string()),
                role: ActiveValue::Set(role.as_str().to_string()),
            };

            // Upsert: insert if missing, otherwise update role.
            match family_memberships::Entity::find_by_id((
                family_id.to_string(),
                member_username.to_string(),
            ))
            .one(&db_tx)
            .await?
            {
                Some(_) => {
                    active.update(&db_tx).await?;
                }
                None => {
                    active.insert(&db_tx).await?;
                }
            }

            Ok(())
        })
    }

    /// Removes a family member.
    pub async fn remove_family_member(
        &self,
        family_id: Uuid,
        member_username: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let family = self.require_family(&db_tx, family_id).await?;
            if member_username == family.created_by {
                return Err(EngineError::InvalidAmount(
                    "cannot remove the family creator".to_string(),
                ));
            }

            family_memberships::Entity::delete_by_id((
                family_id.to_string(),
                member_username.to_string(),
            ))
            .exec(&db_tx)
            .await?;

            Ok(())
        })
    }

    /// Lists family members with their roles.
    pub async fn list_family_members(
        &self,
        family_id: Uuid,
    ) -> ResultEngine<Vec<(String, FamilyRole)>> {
        with_tx!(self, |db_tx| {
            self.require_family(&db_tx, family_id).await?;

            let rows = family_memberships::Entity::find()
                .filter(family_memberships::Column::FamilyId.eq(family_id.to_string()))
                .all(&db_tx)
                .await?;

            rows.into_iter()
                .map(|m| Ok((m.user_id, FamilyRole::try_from(m.role.as_str())?)))
                .collect()
        })
    }

    /// Lists the families a user belongs to.
    pub async fn list_families_for_user(&self, user_id: &str) -> ResultEngine<Vec<Family>> {
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;

            let memberships = family_memberships::Entity::find()
                .filter(family_memberships::Column::UserId.eq(user_id.to_string()))
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(memberships.len());
            for membership in memberships {
                if let Some(model) = families::Entity::find_by_id(membership.family_id)
                    .one(&db_tx)
                    .await?
                {
                    out.push(Family::try_from(model)?);
                }
            }
            Ok(out)
        })
    }
}
