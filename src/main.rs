use {
    actix_web::{middleware, web, App, HttpServer},
    clap::Parser,
    env_logger::Env,
    invite_rsvp::{app_config, config::Config, state::AppState},
    log::{error, info},
    std::io,
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = Config::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let state = match AppState::from_config(&config) {
        Ok(state) => web::Data::new(state),
        Err(err) => {
            error!("Could not set up storage: {}", err);
            return Err(io::Error::new(io::ErrorKind::Other, err.to_string()));
        }
    };
    info!(
        "Serving RSVPs on {} with {} storage, notifications {}",
        config.bind,
        state.store.backend_name(),
        if state.email.is_some() { "on" } else { "off" }
    );

    // start http server
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(app_config)
    })
    .bind(&config.bind)?
    .run()
    .await
}
