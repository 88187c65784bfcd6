use actix_web::{web, HttpResponse};
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::db::Store;
use crate::error::ApiError;
use crate::models::{not_blank, ContactMessage};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/contact")
            .route(web::get().to(list_messages))
            .route(web::post().to(send_message)),
    );
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
struct NewContact {
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    name: String,
    #[validate(email(message = "Invalid Email"))]
    email: String,
    #[validate(custom(function = "not_blank", message = "Subject is required"))]
    subject: String,
    #[validate(custom(function = "not_blank", message = "Message is required"))]
    message: String,
}

async fn send_message(store: web::Data<dyn Store>, data: web::Json<NewContact>) -> Result<HttpResponse, ApiError> {
    let data = data.into_inner();
    data.validate()?;

    let message = ContactMessage {
        id: ObjectId::new().to_hex(),
        name: data.name.trim().to_string(),
        email: data.email.trim().to_string(),
        subject: data.subject.trim().to_string(),
        message: data.message,
        created_at: Utc::now(),
    };
    store.insert_contact(&message).await?;

    log::info!("Contact message {} from {}", message.id, message.email);
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Message sent successfully",
    })))
}

async fn list_messages(store: web::Data<dyn Store>) -> Result<HttpResponse, ApiError> {
    let messages = store.list_contacts().await?;
    Ok(HttpResponse::Ok().json(messages))
}
