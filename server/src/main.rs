use std::io;

use actix_web::{web, App, HttpServer};

use estimation_server::config::AppConfig;
use estimation_server::handlers;
use estimation_server::server::spawn_server;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::load()
        .and_then(|config| config.validate().map(|_| config))
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    let srv_tx = spawn_server(config.policy, config.server.channel_capacity);
    let allowed_origin = config.server.allowed_origin.clone();

    log::info!(
        "Server listening on {}:{}",
        config.server.host,
        config.server.port
    );
    HttpServer::new(move || {
        App::new()
            .wrap(handlers::cors(allowed_origin.as_deref()))
            .app_data(web::Data::new(srv_tx.clone()))
            .configure(handlers::root)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
