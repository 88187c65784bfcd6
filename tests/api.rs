use std::sync::Arc;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use serde_json::{json, Value};

use junhae_store::auth::{self, AuthSettings};
use junhae_store::db::{MemoryStore, Store};
use junhae_store::routes;
use junhae_store::uploads::{ImageStore, MAX_FILES, MAX_FILE_BYTES};

const BOUNDARY: &str = "----junhaeboundary";

struct Harness {
    store: web::Data<dyn Store>,
    images: web::Data<ImageStore>,
    auth: web::Data<AuthSettings>,
    _uploads: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        Harness {
            store: web::Data::from(store),
            images: web::Data::new(ImageStore::new(uploads.path(), "http://localhost:5000")),
            auth: web::Data::new(AuthSettings::new("test-secret")),
            _uploads: uploads,
        }
    }
}

macro_rules! app {
    ($h:expr) => {
        test::init_service(
            App::new()
                .app_data($h.store.clone())
                .app_data($h.images.clone())
                .app_data($h.auth.clone())
                .configure(routes::configure),
        )
        .await
    };
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a str, &'a [u8]),
}

fn multipart(parts: &[Part]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes());
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, content_type, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

fn order_parts<'a>(shipping: &'a str, products: &'a str) -> Vec<Part<'a>> {
    vec![
        Part::Text("customerName", "Mina Park"),
        Part::Text("customerEmail", "mina@example.com"),
        Part::Text("address", "12 Hill St"),
        Part::Text("city", "Seoul"),
        Part::Text("postalCode", "04524"),
        Part::Text("country", "KR"),
        Part::Text("paymentMethod", "bank-transfer"),
        Part::Text("shippingMethod", shipping),
        Part::Text("products", products),
    ]
}

const TEE: &str = r#"[{"name":"Classic Tee","size":"M","color":"black","quantity":2,"price":25}]"#;

fn product_body(name: &str) -> Value {
    json!({
        "name": name,
        "price": 29.99,
        "description": "Heavyweight cotton",
        "category": "tshirts",
        "colors": "[\"black\",\"white\"]",
        "details": ["100% cotton"],
        "bestseller": true,
    })
}

#[actix_web::test]
async fn index_greets() {
    let h = Harness::new();
    let app = app!(h);
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!("Welcome to junhae store"));
}

#[actix_web::test]
async fn product_without_required_fields_is_rejected() {
    let h = Harness::new();
    let app = app!(h);
    let req = test::TestRequest::post()
        .uri("/products")
        .set_json(json!({ "name": "Tee" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Missing required fields: name, price, description, or category"
    );
}

#[actix_web::test]
async fn products_can_be_created_listed_updated_and_deleted() {
    let h = Harness::new();
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/products")
        .set_json(product_body("Classic Tee & Cap"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["product"]["slug"], "classic-tee-and-cap");
    assert_eq!(body["product"]["colors"], json!(["black", "white"]));

    let req = test::TestRequest::post()
        .uri("/products")
        .set_json(product_body("Classic Tee & Cap"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/products?bestseller=true").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);

    let req = test::TestRequest::get().uri("/products?category=hoodies").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 0);

    let req = test::TestRequest::put()
        .uri("/products/classic-tee-and-cap")
        .set_json(json!({ "name": "Oversized Tee", "price": 35.0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["product"]["slug"], "oversized-tee");

    let req = test::TestRequest::get().uri("/products/classic-tee-and-cap").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete().uri("/products/oversized-tee").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::delete().uri("/products/oversized-tee").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn review_rating_must_be_between_one_and_five() {
    let h = Harness::new();
    let app = app!(h);
    let product_id = "65a1f0c2e4b0a1b2c3d4e5f6";

    let req = test::TestRequest::post()
        .uri("/reviews")
        .set_json(json!({ "productId": product_id, "author": "Jo", "rating": 6, "text": "Great" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/reviews")
        .set_json(json!({ "productId": product_id, "rating": 4 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "All fields are required");

    let req = test::TestRequest::post()
        .uri("/reviews")
        .set_json(json!({ "productId": product_id, "author": "Jo Kim", "rating": 5, "text": "Great" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["avatarUrl"], "https://ui-avatars.com/api/?name=Jo%20Kim");

    let req = test::TestRequest::get().uri(&format!("/reviews/{product_id}")).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let req = test::TestRequest::get().uri("/reviews/not-an-id").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn contact_messages_are_validated_and_stored() {
    let h = Harness::new();
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/contact")
        .set_json(json!({ "name": "Jo", "email": "nope", "subject": "Hi", "message": "Hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/contact")
        .set_json(json!({ "name": "Jo", "email": "jo@example.com", "subject": "Hi", "message": "Hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get().uri("/contact").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["email"], "jo@example.com");
}

fn order_request(parts: &[Part<'_>]) -> test::TestRequest {
    let (content_type, body) = multipart(parts);
    test::TestRequest::post()
        .uri("/orders")
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
}

#[actix_web::test]
async fn orders_get_shipping_days_from_their_method() {
    let h = Harness::new();
    let app = app!(h);

    let resp = test::call_service(&app, order_request(&order_parts("express", TEE)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["order"]["shippingDays"], 5);
    assert_eq!(body["order"]["status"], "Processing");
    assert_eq!(body["order"]["total"], 66.0);

    let resp = test::call_service(&app, order_request(&order_parts("standard", TEE)).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["order"]["shippingDays"], 12);

    let req = test::TestRequest::get().uri("/orders?email=mina@example.com").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["orders"].as_array().map(Vec::len), Some(2));
}

#[actix_web::test]
async fn order_with_payment_proof_stores_the_image() {
    let h = Harness::new();
    let app = app!(h);

    let mut parts = order_parts("standard", TEE);
    parts.push(Part::File("paymentProof", "receipt.png", "image/png", b"\x89PNG"));
    let resp = test::call_service(&app, order_request(&parts).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let url = body["order"]["paymentProof"].as_str().unwrap_or_default();
    assert!(url.starts_with("http://localhost:5000/uploads/"));
    assert!(url.ends_with(".png"));
}

#[actix_web::test]
async fn invalid_order_reports_every_field() {
    let h = Harness::new();
    let app = app!(h);

    let parts = vec![Part::Text("customerEmail", "bad"), Part::Text("products", "[]")];
    let resp = test::call_service(&app, order_request(&parts).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"customerEmail"));
    assert!(fields.contains(&"city"));
    assert!(fields.contains(&"products"));
}

#[actix_web::test]
async fn order_status_updates_are_checked() {
    let h = Harness::new();
    let app = app!(h);

    let resp = test::call_service(&app, order_request(&order_parts("standard", TEE)).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    let id = body["order"]["_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/orders/{id}"))
        .set_json(json!({ "status": "Lost" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid status value");

    let req = test::TestRequest::put()
        .uri(&format!("/orders/{id}"))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri(&format!("/orders/{id}"))
        .set_json(json!({ "status": "Shipped" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["order"]["status"], "Shipped");

    let req = test::TestRequest::get().uri("/orders/not-an-id").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/orders/65a1f0c2e4b0a1b2c3d4e5f6")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn checkout_quote_prices_the_cart() {
    let h = Harness::new();
    let app = app!(h);

    let item = json!({ "id": "p1", "name": "Tee", "price": 50.0, "size": "M", "color": "black", "quantity": 1 });
    let req = test::TestRequest::post()
        .uri("/checkout/quote")
        .set_json(json!({ "items": [item.clone(), item], "shippingMethod": "standard" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["quote"]["total"], 113.0);
}

#[actix_web::test]
async fn main_image_upload_requires_an_image() {
    let h = Harness::new();
    let app = app!(h);

    let (content_type, body) = multipart(&[Part::File("image", "notes.txt", "text/plain", b"hello")]);
    let req = test::TestRequest::post()
        .uri("/upload-main")
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (content_type, body) = multipart(&[Part::Text("caption", "none")]);
    let req = test::TestRequest::post()
        .uri("/upload-main")
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "No file uploaded");

    let (content_type, body) = multipart(&[
        Part::File("images", "a.jpg", "image/jpeg", b"a"),
        Part::File("images", "b.webp", "image/webp", b"b"),
    ]);
    let req = test::TestRequest::post()
        .uri("/upload-gallery")
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["urls"].as_array().map(Vec::len), Some(2));
}

#[actix_web::test]
async fn admin_dashboard_needs_a_token() {
    let h = Harness::new();
    auth::seed_admin(h.store.get_ref(), "admin@junhae.com", "hunter22")
        .await
        .unwrap();
    let app = app!(h);

    // Middleware rejections surface as service errors under the test harness.
    let req = test::TestRequest::get().uri("/admin/stats").to_request();
    let status = match test::try_call_service(&app, req).await {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    };
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/admin/login")
        .set_json(json!({ "email": "admin@junhae.com", "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/admin/login")
        .set_json(json!({ "email": "Admin@Junhae.com", "password": "hunter22" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["token"].as_str().unwrap().to_string();

    test::call_service(&app, order_request(&order_parts("standard", TEE)).to_request()).await;

    let req = test::TestRequest::get()
        .uri("/admin/stats")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["totalOrders"], 1);
    assert_eq!(body["totalCustomers"], 1);
    assert_eq!(body["ordersByStatus"]["Processing"], 1);

    let req = test::TestRequest::get()
        .uri("/admin/customers")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["email"], "mina@example.com");
}

#[actix_web::test]
async fn unknown_admin_paths_are_not_found() {
    let h = Harness::new();
    let app = app!(h);

    let req = test::TestRequest::get().uri("/admin/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

fn upload_request(uri: &str, parts: &[Part<'_>]) -> test::TestRequest {
    let (content_type, body) = multipart(parts);
    test::TestRequest::post()
        .uri(uri)
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
}

#[actix_web::test]
async fn gallery_rejects_more_than_the_file_limit() {
    let h = Harness::new();
    let app = app!(h);

    let parts: Vec<Part> = (0..=MAX_FILES)
        .map(|_| Part::File("images", "shot.png", "image/png", b"png"))
        .collect();
    let resp = test::call_service(&app, upload_request("/upload-gallery", &parts).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], format!("At most {MAX_FILES} files can be uploaded at once"));
}

#[actix_web::test]
async fn oversized_image_is_rejected() {
    let h = Harness::new();
    let app = app!(h);

    let big = vec![0u8; MAX_FILE_BYTES + 1];
    let parts = [Part::File("image", "huge.png", "image/png", &big)];
    let resp = test::call_service(&app, upload_request("/upload-main", &parts).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], format!("File is larger than {MAX_FILE_BYTES} bytes"));
}

#[actix_web::test]
async fn quote_with_huge_quantity_is_rejected() {
    let h = Harness::new();
    let app = app!(h);

    let item = json!({ "id": "p1", "name": "Tee", "price": 10.0, "size": "M", "color": "black", "quantity": 4294967295u32 });
    let mut small = item.clone();
    small["quantity"] = json!(1);
    let req = test::TestRequest::post()
        .uri("/checkout/quote")
        .set_json(json!({ "items": [item, small] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["field"], "items[0].quantity");
}

#[actix_web::test]
async fn order_email_with_surrounding_spaces_is_accepted() {
    let h = Harness::new();
    let app = app!(h);

    let mut parts = order_parts("standard", TEE);
    parts[1] = Part::Text("customerEmail", "  mina@example.com ");
    let resp = test::call_service(&app, order_request(&parts).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["order"]["customerEmail"], "mina@example.com");
}
