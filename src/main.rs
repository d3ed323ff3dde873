use std::env::var;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::middleware::from_fn;
use axum::routing::{delete, get, post};
use axum_server::tls_rustls::RustlsConfig;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;

mod config;
mod database;
mod endpoints;
mod mail;
mod model;
mod security;
mod storage;
mod week_calendar;

/// Uploads are capped well above any homework attachment a teacher would send.
const BODY_LIMIT: usize = 64 * 1024 * 1024;

#[tokio::main]
async fn main() {
    // Begin logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Could not install logger: {e}");
    }

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{e}");
            return;
        }
    };
    config::install(config);
    let config = config::get();

    // The server links rustls without a default provider
    _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    // Allow GET, POST, PUT, DELETE and OPTIONS from any origin
    // Allow the Authorization header carrying the session token
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_origin(AllowOrigin::any());

    // Create application
    // Each layer acts as a layer of an onion, with the ones added first
    // acting as the centre of the onion, and the ones added last acting
    // as the outer layers
    let app: Router = Router::new();

    // Admin layer
    // Sits inside the user layer, which resolves who is calling
    let app = app
        .route(
            "/api/students",
            post(endpoints::admin::create_student).put(endpoints::admin::update_student),
        )
        .route("/api/students/{id}", delete(endpoints::admin::delete_student))
        .route(
            "/api/teachers",
            post(endpoints::admin::create_teacher).put(endpoints::admin::update_teacher),
        )
        .route("/api/teachers/{id}", delete(endpoints::admin::delete_teacher))
        .route(
            "/api/schedule",
            post(endpoints::schedule::create_lesson).put(endpoints::schedule::update_lesson),
        )
        .route("/api/schedule/{id}", delete(endpoints::schedule::delete_lesson))
        .route("/api/schedule/{id}/files", post(endpoints::schedule::attach_file))
        .route(
            "/api/schedule/files/{file_id}",
            delete(endpoints::schedule::remove_file),
        )
        .route("/api/upload", post(endpoints::upload::upload_file))
        .route("/api/send-schedule", post(endpoints::mail::send_schedule))
        .layer(from_fn(security::handle_admin_auth));

    // The general User layer
    // These endpoints are accessible by all authenticated users
    let app = app
        .route("/api/auth/check", get(endpoints::check_auth))
        .route("/api/schedule", get(endpoints::get_schedule))
        .route("/api/week", get(endpoints::get_week))
        .route("/api/notifications", get(endpoints::get_notifications))
        .route("/api/students", get(endpoints::list_students))
        .route("/api/teachers", get(endpoints::list_teachers))
        .layer(from_fn(security::handle_basic_auth));

    // Public endpoints
    let app = app.route("/api/login", post(endpoints::login));
    let app = match config.storage.upload_dir.as_ref() {
        Some(upload_dir) => app.nest_service("/files", ServeDir::new(upload_dir)),
        None => app,
    };

    // The CORS and Max Body Limit layers
    let app = app.layer(cors).layer(DefaultBodyLimit::max(BODY_LIMIT));

    // Initialize the database, aborting start-up if an error occurs
    if let Err(e) = database::init_database(&config.database).await {
        tracing::error!("{}", e);
        return;
    };

    info!("Database initialized");

    if let (Ok(login), Ok(password)) = (var("SCHOOLDAY_ADMIN_LOGIN"), var("SCHOOLDAY_ADMIN_PASSWORD")) {
        match database::user::bootstrap_admin(&login, &password).await {
            Ok(true) => info!("Administrator account {login} created"),
            Ok(false) => {}
            Err(e) => tracing::error!("Could not create administrator account: {e}"),
        }
    }

    let address = match config.bind_address.parse::<SocketAddr>() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Invalid bind address {}: {e}", config.bind_address);
            return;
        }
    };

    let served = match config.tls.as_ref() {
        Some(tls) => {
            // Load the certificate for HTTPS
            let rustls_config =
                match RustlsConfig::from_pem_file(&tls.certificate, &tls.private_key).await {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::error!("Could not load TLS certificate: {e}");
                        return;
                    }
                };
            info!("Serving HTTPS on {address}");
            axum_server::bind_rustls(address, rustls_config)
                .serve(app.into_make_service())
                .await
        }
        None => {
            info!("Serving HTTP on {address}");
            axum_server::bind(address)
                .serve(app.into_make_service())
                .await
        }
    };

    if let Err(e) = served {
        tracing::error!("Server stopped: {e}");
    }
}
