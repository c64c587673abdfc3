//! Actix-web middleware.

mod read_only;
mod request_logger;

pub use read_only::ReadOnly;
pub use request_logger::RequestLogger;
