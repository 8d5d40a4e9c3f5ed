pub mod handlers;

use crate::{config::Config, logger, relay::PostRelay};
use actix_web::{middleware::DefaultHeaders, web, App, HttpServer};

pub const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
pub const ALLOWED_METHODS: &str = "POST, GET, OPTIONS";

/// Headers attached to every response so the form can call the relay from
/// another origin.
pub fn cors_headers(origin: &str) -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", origin.to_string()))
        .add(("Access-Control-Allow-Headers", ALLOWED_HEADERS))
        .add(("Access-Control-Allow-Methods", ALLOWED_METHODS))
}

pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(handlers::json_error_handler)
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/generate-post", web::post().to(handlers::generate_post))
        .route("/", web::post().to(handlers::generate_post))
        .route("/health", web::get().to(handlers::health))
        .default_service(web::to(handlers::fallback));
}

pub async fn run(config: Config, relay: PostRelay) -> std::io::Result<()> {
    let host = config.host.clone();
    let port = config.port();
    let origin = config.allowed_origin.clone();
    let limit = config.max_body_bytes();
    let relay = web::Data::new(relay);

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), &host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(relay.clone())
            .app_data(json_config(limit))
            .wrap(cors_headers(&origin))
            .configure(routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
