use actix_web::{web, HttpResponse};

use crate::auth::{self, AuthSettings};
use crate::catalog::ProductFilter;
use crate::customers::{group_customers, DashboardStats};
use crate::db::Store;
use crate::error::ApiError;
use crate::middleware::{AdminAuth, AdminId};
use crate::models::{AuthResponse, LoginInput};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/login", web::post().to(login))
            .service(web::resource("/stats").wrap(AdminAuth).route(web::get().to(stats)))
            .service(web::resource("/customers").wrap(AdminAuth).route(web::get().to(customers))),
    );
}

async fn login(
    store: web::Data<dyn Store>,
    settings: web::Data<AuthSettings>,
    data: web::Json<LoginInput>,
) -> Result<HttpResponse, ApiError> {
    let token = auth::login(store.get_ref(), &settings, &data.email, &data.password).await?;
    Ok(HttpResponse::Ok().json(AuthResponse { token }))
}

async fn stats(store: web::Data<dyn Store>, admin: web::ReqData<AdminId>) -> Result<HttpResponse, ApiError> {
    let products = store.list_products(&ProductFilter::default()).await?;
    let orders = store.list_orders(None).await?;
    log::debug!("Dashboard requested by admin {}", admin.0);
    Ok(HttpResponse::Ok().json(DashboardStats::compute(products.len(), &orders)))
}

async fn customers(store: web::Data<dyn Store>) -> Result<HttpResponse, ApiError> {
    let orders = store.list_orders(None).await?;
    Ok(HttpResponse::Ok().json(group_customers(&orders)))
}
