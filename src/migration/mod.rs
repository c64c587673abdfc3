//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users;
mod m20250301_000002_create_addons;
mod m20250301_000003_create_versions;
mod m20250301_000004_create_categories_previews;
mod m20250301_000005_create_validation;
mod m20250301_000006_create_activity_log;
mod m20250301_000007_create_stats;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users::Migration),
            Box::new(m20250301_000002_create_addons::Migration),
            Box::new(m20250301_000003_create_versions::Migration),
            Box::new(m20250301_000004_create_categories_previews::Migration),
            Box::new(m20250301_000005_create_validation::Migration),
            Box::new(m20250301_000006_create_activity_log::Migration),
            Box::new(m20250301_000007_create_stats::Migration),
        ]
    }
}
