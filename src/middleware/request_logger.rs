//! Request logging middleware.
//!
//! Each request is logged once on arrival and once with its status. Developer
//! hub paths also carry the add-on slug, wizard step or upload they address so
//! a submission can be followed through the log.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::time::Instant;
use tracing::{info, warn};

use crate::api::API_PREFIX;
use crate::config::USER_HEADER;

/// What a developer hub path points at.
#[derive(Debug, Default, PartialEq, Eq)]
struct Target {
    addon: Option<String>,
    step: Option<i32>,
    upload: Option<String>,
}

impl Target {
    fn from_path(path: &str) -> Self {
        let Some(rest) = path
            .strip_prefix(API_PREFIX)
            .and_then(|p| p.strip_prefix("/developers/"))
        else {
            return Self::default();
        };
        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["addon", "submit", step, ..] => Self {
                step: step.parse().ok(),
                ..Self::default()
            },
            ["addon", slug, rest @ ..] => Self {
                addon: Some((*slug).to_string()),
                step: match rest {
                    ["submit", step, ..] => step.parse().ok(),
                    _ => None,
                },
                upload: None,
            },
            ["upload", id, ..] => Self {
                upload: Some((*id).to_string()),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let target = Target::from_path(&path);
        let user = req
            .headers()
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("anonymous")
            .to_string();
        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        info!(
            target: "api",
            method = %method,
            path = %path,
            user = %user,
            addon = %or_dash(&target.addon),
            step = ?target.step,
            upload = %or_dash(&target.upload),
            remote_addr = %remote_addr,
            "→ Request started"
        );

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let status = res.status();
            let duration_ms = start.elapsed().as_millis();
            // Redirects out of the wizard show where the gate sent the caller.
            let location = res
                .headers()
                .get(actix_web::http::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();

            if status.is_client_error() || status.is_server_error() {
                warn!(
                    target: "api",
                    method = %method,
                    path = %path,
                    user = %user,
                    addon = %or_dash(&target.addon),
                    step = ?target.step,
                    status = status.as_u16(),
                    duration_ms = %duration_ms,
                    "← Request failed"
                );
            } else {
                info!(
                    target: "api",
                    method = %method,
                    path = %path,
                    user = %user,
                    addon = %or_dash(&target.addon),
                    step = ?target.step,
                    status = status.as_u16(),
                    location = %location,
                    duration_ms = %duration_ms,
                    "← Request completed"
                );
            }

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(path: &str) -> Target {
        Target::from_path(&format!("{}{}", API_PREFIX, path))
    }

    #[test]
    fn test_wizard_paths() {
        assert_eq!(
            target("/developers/addon/submit/2"),
            Target { step: Some(2), ..Target::default() }
        );
        assert_eq!(
            target("/developers/addon/tab-mixer/submit/4"),
            Target {
                addon: Some("tab-mixer".into()),
                step: Some(4),
                upload: None,
            }
        );
        // Resume is not a numbered step
        assert_eq!(target("/developers/addon/tab-mixer/submit/resume").step, None);
    }

    #[test]
    fn test_management_and_upload_paths() {
        let edit = target("/developers/addon/tab-mixer/edit/support");
        assert_eq!(edit.addon.as_deref(), Some("tab-mixer"));
        assert_eq!(edit.step, None);

        let upload = target("/developers/upload/0b7c2f6e-2f5e-4a55-9b0a-3c3d3c1f4d11/json");
        assert_eq!(
            upload.upload.as_deref(),
            Some("0b7c2f6e-2f5e-4a55-9b0a-3c3d3c1f4d11")
        );
        assert_eq!(upload.addon, None);
    }

    #[test]
    fn test_other_paths_have_no_target() {
        assert_eq!(target("/health"), Target::default());
        assert_eq!(Target::from_path("/swagger-ui/"), Target::default());
        assert_eq!(target("/developers/addons"), Target::default());
    }
}
