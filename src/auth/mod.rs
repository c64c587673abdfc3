//! Authentication of developers identified upstream.

mod extractor;

pub use extractor::{AuthError, CurrentUser};
