//! Raw daily download counts of an add-on through a collection.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "stats_addons_collections_counts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub addon_id: i64,
    pub collection_id: i64,
    pub count: i32,
    pub date: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
