use actix_service::{forward_ready, Service};
use actix_web::dev::{ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, HttpMessage};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::AuthSettings;
use crate::error::ApiError;

/// Id of the admin whose bearer token authorized the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminId(pub String);

/// Rejects requests without a valid admin bearer token. On success the
/// request carries an [`AdminId`] extension, readable with
/// `web::ReqData<AdminId>`.
pub struct AdminAuth;

impl<S, B> Transform<S, ServiceRequest> for AdminAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AdminAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AdminAuthMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct AdminAuthMiddleware<S> {
    service: Rc<S>,
}

fn bearer_token(req: &ServiceRequest) -> Result<&str, ApiError> {
    let header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| ApiError::Unauthorized("Authorization header missing".into()))?;
    let value = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid authorization header".into()))?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Invalid authorization scheme".into()))
}

impl<S, B> Service<ServiceRequest> for AdminAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let settings = req
                .app_data::<web::Data<AuthSettings>>()
                .cloned()
                .ok_or_else(|| ApiError::Internal("auth settings are not registered".into()))?;

            let admin_id = settings.verify_token(bearer_token(&req)?)?;
            req.extensions_mut().insert(AdminId(admin_id));
            service.call(req).await
        })
    }
}
