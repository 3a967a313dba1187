#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::{
    config::{Config, ConfigFairing, DatabaseFairing},
    logging::LoggerFairing,
    manager::ElectionManager,
};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod model;

/// The server, configured from `Rocket.toml` and backed by PostgreSQL.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .mount("/", api::routes())
}

/// The server with an already constructed manager and config, skipping the
/// config and database fairings.
pub fn rocket_for_manager(manager: ElectionManager, config: Config) -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .manage(config)
        .manage(manager)
        .mount("/", api::routes())
}
