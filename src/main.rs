// Web server entry point
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use log::{debug, error, info};
use premium_server::config::Config;
use premium_server::state::AppState;
use premium_server::{api, logging};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(&config.log_path())?;
    debug!("Starting app and loading the models");

    let state = match AppState::load(
        &config.model_path(),
        &config.preprocessor_path(),
        config.expose_error_details,
    ) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to load models: {e:?}");
            return Err(e);
        }
    };
    debug!("Models are loaded successfully!");

    let shared_state = web::Data::new(state);
    info!("Listening on http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(shared_state.clone())
            .configure(api::configure)
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .run()
    .await?;
    Ok(())
}
