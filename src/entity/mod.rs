//! SeaORM entity definitions.

pub mod activity_log;
pub mod addon;
pub mod addon_category;
pub mod addon_collection;
pub mod addon_collection_count;
pub mod addon_user;
pub mod app_support;
pub mod category;
pub mod collection;
pub mod collection_count;
pub mod contribution;
pub mod file;
pub mod file_upload;
pub mod license;
pub mod preview;
pub mod submit_step;
pub mod user;
pub mod validation_result;
pub mod version;
pub mod version_app;
