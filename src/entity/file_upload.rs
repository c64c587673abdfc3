//! Uploaded package awaiting submission, addressed by an opaque token.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "file_uploads")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<i64>,
    /// Original filename as sent by the browser
    pub name: String,
    /// Stored path, relative to the data directory
    pub path: String,
    pub size: i64,
    /// sha256:<hex>
    pub hash: String,
    /// Serialized validator payload once validation has run
    #[sea_orm(column_type = "Text", nullable)]
    pub validation: Option<String>,
    /// Validator traceback when validation crashed
    #[sea_orm(column_type = "Text", nullable)]
    pub task_error: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
