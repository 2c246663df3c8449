use std::env;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub db_user: String,
    pub db_password: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_max_connections: u32,

    pub server_host: String,
    pub server_port: u16,

    // Seconds before an in-flight request is abandoned
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            db_user: Self::env_required("DB_USER")?,
            db_password: Self::env_required("DB_PASSWORD")?,
            db_host: Self::env_required("DB_HOST")?,
            db_port: Self::env_parsed("DB_PORT", 5432),
            db_name: Self::env_required("DB_NAME")?,
            db_max_connections: Self::env_parsed("DB_MAX_CONNECTIONS", 10),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: Self::env_parsed("SERVER_PORT", 8080),
            request_timeout_secs: Self::env_parsed("REQUEST_TIMEOUT_SECS", 30),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would leave the server unusable.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be at least 1");
        }
        if self.db_max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
        }
        Ok(())
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }

    /// Connection string with the password masked, for logs.
    pub fn redacted_database_url(&self) -> String {
        format!(
            "postgres://{}:***@{}:{}/{}",
            self.db_user, self.db_host, self.db_port, self.db_name
        )
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    fn env_required(key: &str) -> anyhow::Result<String> {
        env::var(key).with_context(|| format!("{} must be set", key))
    }

    fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
        env::var(key)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_user: "where_are_they".to_string(),
            db_password: String::new(),
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_name: "where_are_they".to_string(),
            db_max_connections: 10,
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            request_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_url_is_built_from_parts() {
        let config = Config {
            db_user: "bus".into(),
            db_password: "s3cret".into(),
            db_host: "db".into(),
            db_name: "transport".into(),
            ..Config::default()
        };

        assert_eq!(config.database_url(), "postgres://bus:s3cret@db:5432/transport");
        assert_eq!(config.redacted_database_url(), "postgres://bus:***@db:5432/transport");
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn unparsable_numbers_fall_back_to_defaults() {
        std::env::set_var("WHERE_ARE_THEY_TEST_PORT", "not-a-port");
        assert_eq!(Config::env_parsed::<u16>("WHERE_ARE_THEY_TEST_PORT", 8080), 8080);
        assert_eq!(Config::env_parsed::<u64>("WHERE_ARE_THEY_TEST_UNSET", 30), 30);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("REQUEST_TIMEOUT_SECS"));
        assert!(Config::default().validate().is_ok());
    }
}
