use std::time::Duration;

use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::{
    manager::ElectionManager,
    model::{
        common::election::ElectionStatus,
        postgres::{ensure_schema_exists, PgElectionRepository},
    },
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    default_status_filter: Option<ElectionStatus>,
}

impl Config {
    pub fn new(default_status_filter: Option<ElectionStatus>) -> Self {
        Self {
            default_status_filter,
        }
    }

    /// Status used to filter listings when the client does not ask for one.
    /// `None` lists every status.
    pub fn default_status_filter(&self) -> Option<ElectionStatus> {
        self.default_status_filter
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the database fairing and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

#[derive(Debug, Error)]
enum DbConfigError {
    #[error("set either `db_uri` or `db_user`, `db_password_file`, `db_host` and `db_name`")]
    Incomplete,
    #[error("could not read database password from {path}: {source}")]
    PasswordFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for the database.
///
/// Either a complete `db_uri`, or its parts with the password kept in a
/// separate file.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: Option<String>,
    db_password_file: Option<String>,
    // non-secrets
    db_user: Option<String>,
    db_host: Option<String>,
    db_name: Option<String>,
    #[serde(default = "default_ssl_mode")]
    db_ssl_mode: String,
    #[serde(default = "default_max_connections")]
    db_max_connections: u32,
    #[serde(default)]
    db_min_connections: u32,
    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_acquire_timeout")]
    db_acquire_timeout: u64,
}

fn default_ssl_mode() -> String {
    "disable".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

impl DbConfig {
    /// The connection URL, reading the password file if needed.
    fn url(&self) -> Result<String, DbConfigError> {
        if let Some(uri) = &self.db_uri {
            return Ok(uri.clone());
        }
        let (Some(user), Some(password_file), Some(host), Some(name)) = (
            &self.db_user,
            &self.db_password_file,
            &self.db_host,
            &self.db_name,
        ) else {
            return Err(DbConfigError::Incomplete);
        };
        let password = std::fs::read_to_string(password_file).map_err(|source| {
            DbConfigError::PasswordFile {
                path: password_file.clone(),
                source,
            }
        })?;
        Ok(format!(
            "postgres://{user}:{}@{host}/{name}?sslmode={}",
            password.trim(),
            self.db_ssl_mode
        ))
    }
}

/// A fairing that loads the PostgreSQL config, connects to the database,
/// creates any missing tables, and places an `ElectionManager` backed by the
/// database into managed state.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "PostgreSQL",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        let url = match config.url() {
            Ok(url) => url,
            Err(e) => {
                error!("Failed to load database config: {e}");
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");

        // Construct the pool.
        let pool = match PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .min_connections(config.db_min_connections)
            .acquire_timeout(Duration::from_secs(config.db_acquire_timeout))
            .connect(&url)
            .await
        {
            Ok(pool) => pool,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };

        // Ensure the tables exist.
        if let Err(e) = ensure_schema_exists(&pool).await {
            error!("Failed to create database schema: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        // Manage the state.
        rocket = rocket.manage(ElectionManager::new(PgElectionRepository::new(pool)));
        Ok(rocket)
    }
}
