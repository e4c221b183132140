use crate::config::AppConfig;
use crate::db::connection::{init_db, Database};
use crate::remote::ApiClient;
use crate::router::{respond, App};
use astra::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod auth;
mod config;
mod db;
mod domain;
mod errors;
mod publish;
mod remote;
mod resolver;
mod responses;
mod router;
mod sync;
mod templates;

#[cfg(test)]
mod tests;

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "property_board=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    if !config.default_category_confirmed {
        tracing::warn!(
            default = %config.default_category,
            "DEFAULT_CATEGORY not set, unrecognised property types go to the fallback category"
        );
    }
    if config.operator.is_none() {
        tracing::warn!("no operator configured, dashboard login is disabled");
    }
    if let Some(publish) = &config.publish {
        tracing::info!(username = %publish.username, "operator changes will be mirrored to the listings API");
    }

    let db = Database::new(config.database_path.clone());
    if let Err(e) = init_db(&db) {
        tracing::error!(error = %e, "database initialization failed");
        std::process::exit(1);
    }

    let remote = match ApiClient::new(config.api_base_url()) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "could not build API client");
            std::process::exit(1);
        }
    };
    match remote.health() {
        Ok(health) => tracing::info!(base_url = remote.base_url(), status = %health.status, "listings API reachable"),
        Err(e) => tracing::warn!(base_url = remote.base_url(), error = %e, "listings API unreachable, pages will use local data"),
    }

    let app = App::new(db, config, remote);
    crate::sync::spawn_periodic_sync(&app.db, app.table.clone(), app.config.sync_interval);

    let addr = app.config.bind_addr;
    tracing::info!(%addr, "starting server");

    let server = Server::bind(&addr).max_workers(app.config.max_workers);
    let result = server.serve(move |req, _info| respond(req, &app));

    if let Err(e) = result {
        tracing::error!(error = %e, "server ended with error");
    }

    tracing::info!("server shut down");
}
