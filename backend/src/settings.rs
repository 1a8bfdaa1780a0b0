//! Process settings loaded via OrthoConfig.
//!
//! Values come from `TIMETABLE_*` environment variables, command-line flags
//! and configuration files, in OrthoConfig's usual precedence.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::grid::{GridError, GridShape};
use crate::domain::{DEFAULT_DAYS_COUNT, DEFAULT_MAX_WRITE_ATTEMPTS, DEFAULT_PERIOD_COUNT};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Server settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TIMETABLE")]
pub struct AppSettings {
    /// Listen address.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without one, state lives in memory.
    pub database_url: Option<String>,
    /// Read-modify-write attempts before a revision race becomes a conflict.
    pub max_write_attempts: Option<u32>,
    /// Days for organisations created without an explicit shape.
    pub default_days_count: Option<usize>,
    /// Periods per day for organisations created without an explicit shape.
    pub default_period_count: Option<usize>,
    /// Upper bound of the database connection pool.
    pub db_max_connections: Option<u32>,
}

/// Settings that parse but cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TIMETABLE_BIND_ADDR '{value}' is not a socket address: {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("default grid shape is invalid: {0}")]
    Shape(#[from] GridError),
}

impl AppSettings {
    /// The listen address, `0.0.0.0:8080` unless configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Shape assigned to organisations created without dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Shape`] when either dimension is zero.
    pub fn default_shape(&self) -> Result<GridShape, SettingsError> {
        Ok(GridShape::new(
            self.default_days_count.unwrap_or(DEFAULT_DAYS_COUNT),
            self.default_period_count.unwrap_or(DEFAULT_PERIOD_COUNT),
        )?)
    }

    #[must_use]
    pub fn max_write_attempts(&self) -> u32 {
        self.max_write_attempts
            .unwrap_or(DEFAULT_MAX_WRITE_ATTEMPTS)
            .max(1)
    }

    #[must_use]
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    /// The database URL, ignoring blank values.
    #[must_use]
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "TIMETABLE_BIND_ADDR",
        "TIMETABLE_DATABASE_URL",
        "TIMETABLE_MAX_WRITE_ATTEMPTS",
        "TIMETABLE_DEFAULT_DAYS_COUNT",
        "TIMETABLE_DEFAULT_PERIOD_COUNT",
        "TIMETABLE_DB_MAX_CONNECTIONS",
    ];

    fn load() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("timetable")]).expect("settings load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load();

        assert_eq!(
            settings.bind_addr().expect("default address"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("literal")
        );
        assert_eq!(settings.database_url(), None);
        assert_eq!(settings.max_write_attempts(), DEFAULT_MAX_WRITE_ATTEMPTS);
        assert_eq!(settings.db_max_connections(), DEFAULT_DB_MAX_CONNECTIONS);
        let shape = settings.default_shape().expect("default shape");
        assert_eq!(
            (shape.days_count(), shape.period_count()),
            (DEFAULT_DAYS_COUNT, DEFAULT_PERIOD_COUNT)
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("TIMETABLE_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            ("TIMETABLE_DATABASE_URL", Some("postgres://localhost/tt".to_owned())),
            ("TIMETABLE_MAX_WRITE_ATTEMPTS", Some("5".to_owned())),
            ("TIMETABLE_DEFAULT_DAYS_COUNT", Some("6".to_owned())),
            ("TIMETABLE_DEFAULT_PERIOD_COUNT", Some("7".to_owned())),
            ("TIMETABLE_DB_MAX_CONNECTIONS", Some("4".to_owned())),
        ]);

        let settings = load();

        assert_eq!(settings.bind_addr().expect("address").port(), 9000);
        assert_eq!(settings.database_url(), Some("postgres://localhost/tt"));
        assert_eq!(settings.max_write_attempts(), 5);
        assert_eq!(settings.db_max_connections(), 4);
        assert_eq!(settings.default_shape().expect("shape").slot_count(), 42);
    }

    #[rstest]
    #[case("TIMETABLE_DEFAULT_DAYS_COUNT", "0")]
    #[case("TIMETABLE_BIND_ADDR", "not-an-address")]
    fn unusable_values_are_reported(#[case] name: &str, #[case] value: &str) {
        let mut vars = VARS.map(|var| (var, None::<String>));
        for entry in &mut vars {
            if entry.0 == name {
                entry.1 = Some(value.to_owned());
            }
        }
        let _guard = lock_env(vars);

        let settings = load();

        assert!(
            settings.bind_addr().is_err() || settings.default_shape().is_err()
        );
    }

    #[rstest]
    fn blank_database_url_means_in_memory() {
        let mut vars = VARS.map(|name| (name, None::<String>));
        vars[1].1 = Some("   ".to_owned());
        let _guard = lock_env(vars);

        assert_eq!(load().database_url(), None);
    }
}
