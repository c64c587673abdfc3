//! Shared state handed to every handler, and the routes that use it.

use std::sync::Arc;

use actix_web::web;

use crate::api;
use crate::config::Config;
use crate::db::DbPool;
use crate::services::{OutgoingLinker, Storage, TaskQueue, Validator};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub storage: Storage,
    pub queue: Arc<dyn TaskQueue>,
    /// Used inline by the file validation endpoint; uploads go through the queue.
    pub validator: Arc<dyn Validator>,
}

impl AppState {
    /// Register app data and mount the API under `/api/v1`.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.pool.clone()))
            .app_data(web::Data::new(self.config.clone()))
            .app_data(web::Data::new(self.storage.clone()))
            .app_data(web::Data::new(OutgoingLinker::new(&self.config.redirect)))
            .app_data(web::Data::from(Arc::clone(&self.queue)))
            .app_data(web::Data::from(Arc::clone(&self.validator)))
            .service(web::scope(api::API_PREFIX).configure(api::configure_routes));
    }
}
