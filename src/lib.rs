//! Add-on developer hub library.
//!
//! Submission wizard, validation, add-on management and the periodic
//! aggregation jobs behind the developer hub API.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
