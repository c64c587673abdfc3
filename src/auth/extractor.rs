//! Actix-web extractor for the upstream-authenticated developer.

use std::future::Future;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};

use crate::config::USER_HEADER;
use crate::db::DbPool;
use crate::error::ErrorResponse;
use crate::models::AuthenticatedUser;

/// Authentication error for extractors.
#[derive(Debug)]
pub struct AuthError {
    status: StatusCode,
    message: String,
}

impl AuthError {
    fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        let error = if self.status == StatusCode::UNAUTHORIZED {
            "UNAUTHORIZED"
        } else {
            "INTERNAL_ERROR"
        };
        HttpResponse::build(self.status).json(ErrorResponse {
            error: error.to_string(),
            message: self.message.clone(),
            errors: None,
        })
    }
}

/// Parse the user id header. `None` when missing or malformed.
fn user_id_from_header(req: &HttpRequest) -> Option<i64> {
    req.headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok())
}

/// Extractor that requires a known user.
///
/// ```ignore
/// async fn handler(user: CurrentUser) -> impl Responder {
///     // user.0 is the authenticated developer
/// }
/// ```
pub struct CurrentUser(pub AuthenticatedUser);

impl FromRequest for CurrentUser {
    type Error = AuthError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let pool = req.app_data::<web::Data<DbPool>>().cloned();
        let user_id = user_id_from_header(req);

        Box::pin(async move {
            let pool =
                pool.ok_or_else(|| AuthError::internal("Internal configuration error"))?;
            let user_id = user_id.ok_or_else(|| {
                AuthError::unauthorized(format!("Missing user. Provide {} header.", USER_HEADER))
            })?;

            match pool.get_authenticated_user(user_id).await {
                Ok(Some(user)) => Ok(CurrentUser(user)),
                Ok(None) => Err(AuthError::unauthorized("Unknown user")),
                Err(e) => {
                    tracing::error!("Failed to resolve user {}: {}", user_id, e);
                    Err(AuthError::internal("Failed to resolve user"))
                }
            }
        })
    }
}
