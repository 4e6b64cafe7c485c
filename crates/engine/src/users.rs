//! Users table (minimal entity).
//!
//! The engine stores ownership and memberships by `user_id`, which is the
//! username. Authentication and the admin/user role split are enforced by the
//! API layer; the engine only needs the rows to exist.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub role: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
