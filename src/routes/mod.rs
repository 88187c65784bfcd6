//! HTTP surface of the store.
//!
//! Handlers expect these in app data: `web::Data<dyn Store>`,
//! `web::Data<ImageStore>` and `web::Data<AuthSettings>`.

mod admin;
mod checkout;
mod contact;
mod orders;
mod products;
mod reviews;
mod uploads;

use actix_web::{web, HttpResponse, Responder};
use mongodb::bson::oid::ObjectId;

use crate::error::ApiError;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(format!("Invalid request body: {err}")).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(format!("Invalid query string: {err}")).into()),
    )
    .route("/", web::get().to(index))
    .configure(products::configure)
    .configure(reviews::configure)
    .configure(contact::configure)
    .configure(orders::configure)
    .configure(uploads::configure)
    .configure(checkout::configure)
    .configure(admin::configure);
}

async fn index() -> impl Responder {
    HttpResponse::Ok().json("Welcome to junhae store")
}

/// Rejects ids that are not 24-character hex ObjectIds.
fn object_id(raw: &str, what: &str) -> Result<String, ApiError> {
    ObjectId::parse_str(raw)
        .map(|oid| oid.to_hex())
        .map_err(|_| ApiError::BadRequest(format!("Invalid {what} ID format")))
}
