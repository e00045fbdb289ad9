use anyhow::{Result, bail};
use dotenvy::dotenv;
use serde::Deserialize;

fn default_max_connections() -> u32 {
    5
}

/// Configuration for the application
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Database connection URL, may also come from the command line
    #[serde(default)]
    pub database_url: String,

    /// Size of the connection pool
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,
}

impl Config {
    /// Replaces the database URL, typically from a command line flag
    pub fn with_database_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.database_url = url;
        }
        self
    }

    fn validated(self) -> Result<Self> {
        if self.database_url.trim().is_empty() {
            bail!("DATABASE_URL is not set and no --database-url was given");
        }
        Ok(self)
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Load configuration from environment variables, reading `.env` first if it exists.
///
/// `database_url`, when given, overrides DATABASE_URL.
pub fn init(database_url: Option<String>) -> Result<Config> {
    dotenv().ok();

    // DATABASE_URL, DB_MAX_CONNECTIONS
    resolve(envy::from_env::<Config>(), database_url)
}

fn resolve(
    env: std::result::Result<Config, envy::Error>,
    database_url: Option<String>,
) -> Result<Config> {
    env?.with_database_url(database_url).validated()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn pool_size_defaults_to_five() {
        let env = vars(&[("DATABASE_URL", "postgres://localhost/cae")]);
        let config: Config = envy::from_iter(env).unwrap();
        assert_eq!(config.database_url(), "postgres://localhost/cae");
        assert_eq!(config.db_max_connections, 5);
    }

    #[test]
    fn pool_size_is_read_from_the_environment() {
        let env = vars(&[("DATABASE_URL", "postgres://db/cae"), ("DB_MAX_CONNECTIONS", "12")]);
        let config: Config = envy::from_iter(env).unwrap();
        assert_eq!(config.db_max_connections, 12);
    }

    fn flag() -> Option<String> {
        Some("postgres://flag/cae".to_string())
    }

    #[test]
    fn malformed_pool_size_is_an_error_even_with_a_url_flag() {
        let env = envy::from_iter(vars(&[("DB_MAX_CONNECTIONS", "lots")]));
        assert!(resolve(env, flag()).is_err());
    }

    #[test]
    fn command_line_url_wins() {
        let env = vars(&[("DATABASE_URL", "postgres://env/cae"), ("DB_MAX_CONNECTIONS", "3")]);
        let config = resolve(envy::from_iter(env), flag()).unwrap();
        assert_eq!(config.database_url(), "postgres://flag/cae");
        assert_eq!(config.db_max_connections, 3);
    }

    #[test]
    fn url_may_come_from_the_command_line_only() {
        let config = resolve(envy::from_iter(vars(&[])), flag()).unwrap();
        assert_eq!(config.database_url(), "postgres://flag/cae");
        assert_eq!(config.db_max_connections, 5);
    }

    #[test]
    fn missing_url_is_an_error() {
        assert!(resolve(envy::from_iter(vars(&[])), None).is_err());
    }
}
