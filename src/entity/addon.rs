//! Add-on entity.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "addons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub guid: Option<String>,
    #[sea_orm(unique)]
    pub slug: String,
    pub name: String,
    /// See `models::AddonType`
    pub addon_type: i32,
    /// See `models::AddonStatus`
    pub status: i32,
    pub summary: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub support_email: Option<String>,
    pub support_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub developer_comments: Option<String>,
    pub default_locale: String,
    pub icon_type: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub privacy_policy: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub eula: Option<String>,
    pub view_source: bool,
    pub binary: bool,
    pub disabled_by_user: bool,
    pub current_version_id: Option<i64>,
    pub last_updated: Option<DateTimeUtc>,
    /// Sum of contributions in cents, maintained by the aggregation jobs
    pub total_contributions: i64,
    pub created_at: DateTimeUtc,
    pub modified_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::version::Entity")]
    Versions,
    #[sea_orm(has_many = "super::addon_user::Entity")]
    AddonUsers,
    #[sea_orm(has_many = "super::preview::Entity")]
    Previews,
    #[sea_orm(has_one = "super::submit_step::Entity")]
    SubmitStep,
}

impl Related<super::version::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Versions.def()
    }
}

impl Related<super::addon_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AddonUsers.def()
    }
}

impl Related<super::preview::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Previews.def()
    }
}

impl Related<super::submit_step::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubmitStep.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
