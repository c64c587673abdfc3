//! Developer hub end-to-end test suite.
//!
//! Every test gets its own SQLite database and data directory under a
//! temporary directory; background tasks run inline.
//!
//! Run with: cargo test --test devhub

mod test_helpers;

mod test_aggregates;
mod test_manage;
mod test_read_only;
mod test_submit_flow;
mod test_validation_cache;
