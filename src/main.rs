mod backend;
mod cli;
mod client;
mod config;
mod error;
mod handlers;
mod logging;
mod models;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use cli::Args;
use client::PredictionClient;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing(args.log_json);

    let config = args.client_config();
    let client = web::Data::new(PredictionClient::new(&config)?);
    info!(
        bind = %args.bind,
        endpoint = %config.predict_url(),
        protocol = ?config.protocol,
        timeout_secs = config.timeout.as_secs(),
        "prediction ui listening"
    );

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(client.clone())
            .service(web::resource("/").route(web::get().to(handlers::index)))
            .service(web::resource("/predict").route(web::post().to(handlers::predict)))
            .service(web::resource("/health").route(web::get().to(handlers::health)))
    })
    .bind(args.bind.as_str())?
    .run()
    .await?;

    Ok(())
}
