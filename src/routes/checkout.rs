use actix_web::{web, HttpResponse};

use crate::checkout::QuoteRequest;
use crate::error::ApiError;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/checkout/quote", web::post().to(quote));
}

/// Prices a cart without placing an order.
async fn quote(data: web::Json<QuoteRequest>) -> Result<HttpResponse, ApiError> {
    let priced = data.into_inner().price()?;
    Ok(HttpResponse::Ok().json(priced))
}
