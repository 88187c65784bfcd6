use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::object_id;
use crate::checkout::OrderForm;
use crate::db::Store;
use crate::error::{ApiError, FieldError};
use crate::models::OrderStatus;
use crate::uploads::ImageStore;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/orders")
            .route(web::get().to(list_orders))
            .route(web::post().to(create_order)),
    )
    .service(
        web::resource("/orders/{id}")
            .route(web::get().to(get_order))
            .route(web::put().to(update_order_status)),
    );
}

#[derive(Debug, Deserialize)]
struct OrderQuery {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: Option<String>,
}

async fn list_orders(store: web::Data<dyn Store>, query: web::Query<OrderQuery>) -> Result<HttpResponse, ApiError> {
    let email = query.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let orders = store.list_orders(email).await?;
    Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

async fn get_order(store: web::Data<dyn Store>, id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = object_id(&id, "order")?;
    match store.find_order(&id).await? {
        Some(order) => Ok(HttpResponse::Ok().json(json!({ "order": order }))),
        None => Err(ApiError::NotFound("Order not found".into())),
    }
}

async fn create_order(
    store: web::Data<dyn Store>,
    images: web::Data<ImageStore>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut form = images.read_form(payload).await?;
    let proof = form.take_file("paymentProof");

    // Validate before the proof touches the disk.
    let mut order = OrderForm::from_fields(form.fields)?.into_order(None)?;
    if let Some(file) = proof {
        order.payment_proof = Some(images.save(file).await?);
    }
    store.insert_order(&order).await?;

    log::info!("Order {} placed by {} ({:.2})", order.id, order.customer_email, order.total);
    Ok(HttpResponse::Created().json(json!({
        "message": "Order placed successfully",
        "order": order,
    })))
}

async fn update_order_status(
    store: web::Data<dyn Store>,
    id: web::Path<String>,
    data: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let id = object_id(&id, "order")?;
    let Some(raw) = data.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Err(ApiError::validation(
            "Status is required",
            vec![FieldError::new("status", "Status is required")],
        ));
    };
    let status: OrderStatus = raw
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid status value".into()))?;

    let order = store
        .set_order_status(&id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;

    log::info!("Order {} is now {}", order.id, status);
    Ok(HttpResponse::Ok().json(json!({
        "message": "Order status updated successfully",
        "order": order,
    })))
}
