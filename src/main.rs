use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use junhae_store::auth::{self, AuthSettings};
use junhae_store::config::Config;
use junhae_store::db::{MongoStore, Store};
use junhae_store::routes;
use junhae_store::uploads::ImageStore;

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(startup_error)?;

    let store: Arc<dyn Store> = Arc::new(
        MongoStore::connect(&config.database_url, &config.database_name)
            .await
            .map_err(startup_error)?,
    );
    if let Some(admin) = &config.admin {
        auth::seed_admin(store.as_ref(), &admin.email, &admin.password)
            .await
            .map_err(startup_error)?;
    }
    let store = web::Data::from(store);

    std::fs::create_dir_all(&config.upload_dir)?;
    let images = web::Data::new(ImageStore::new(config.upload_dir.clone(), config.public_url.clone()));
    let auth_settings = web::Data::new(AuthSettings::new(config.jwt_secret.clone()));
    let frontend_url = config.frontend_url.clone();

    log::info!("Listening on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        let cors = match &frontend_url {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .supports_credentials(),
            None => Cors::permissive(),
        };

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(store.clone())
            .app_data(images.clone())
            .app_data(auth_settings.clone())
            .service(Files::new("/uploads", images.dir().clone()))
            .configure(routes::configure)
    })
    .bind((config.host, config.port))?
    .run()
    .await
}
