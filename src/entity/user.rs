//! User entity. Identity is established upstream; this table holds the
//! site role used for permission checks.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    /// developer, editor or admin
    pub role: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::addon_user::Entity")]
    AddonUsers,
}

impl Related<super::addon_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AddonUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
