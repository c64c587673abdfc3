//! Membership of an add-on in a collection.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "addons_collections")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub addon_id: i64,
    pub collection_id: i64,
    /// Downloads through this collection, maintained by the aggregation jobs
    pub downloads: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
