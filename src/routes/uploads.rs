use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::ApiError;
use crate::uploads::ImageStore;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/upload-main", web::post().to(upload_main))
        .route("/upload-gallery", web::post().to(upload_gallery));
}

async fn upload_main(images: web::Data<ImageStore>, payload: Multipart) -> Result<HttpResponse, ApiError> {
    let mut form = images.read_form(payload).await?;
    let file = form
        .take_file("image")
        .ok_or_else(|| ApiError::BadRequest("No file uploaded".into()))?;
    let url = images.save(file).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Main image uploaded successfully",
        "url": url,
    })))
}

async fn upload_gallery(images: web::Data<ImageStore>, payload: Multipart) -> Result<HttpResponse, ApiError> {
    let mut form = images.read_form(payload).await?;
    let files = form.take_files("images");
    if files.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".into()));
    }
    let urls = images.save_all(files).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Gallery images uploaded successfully",
        "urls": urls,
    })))
}
