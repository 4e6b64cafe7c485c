//! Families group users for shared read/write access to each other's
//! accounts.
//!
//! The engine only stores the grouping; the authorization decisions built on
//! top of it (who may touch which account) live in the API layer.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub id: Uuid,
    pub name: String,
    pub created_by: String,
}

impl Family {
    pub fn new(name: String, created_by: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_by,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "families")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::family_memberships::Entity")]
    Memberships,
}

impl Related<super::family_memberships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Family> for ActiveModel {
    fn from(family: &Family) -> Self {
        Self {
            id: ActiveValue::Set(family.id.to_string()),
            name: ActiveValue::Set(family.name.clone()),
            created_by: ActiveValue::Set(family.created_by.clone()),
        }
    }
}

impl TryFrom<Model> for Family {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "family")?,
            name: model.name,
            created_by: model.created_by,
        })
    }
}
