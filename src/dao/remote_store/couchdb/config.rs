use std::{env, time::Duration};

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_LONGPOLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime configuration describing how to reach the shared CouchDB database.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    pub base_url: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// How long a `_changes` long-poll request may wait for a change.
    pub longpoll_timeout: Duration,
}

impl CouchConfig {
    /// Construct a configuration from an explicit base URL and database name.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            username: None,
            password: None,
            longpoll_timeout: DEFAULT_LONGPOLL_TIMEOUT,
        }
    }

    /// Attach basic-auth credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Build a configuration from `COUCH_BASE_URL`, `COUCH_DB` and the optional
    /// `COUCH_USERNAME` / `COUCH_PASSWORD` pair.
    ///
    /// A missing or blank mandatory variable means no remote store is configured.
    pub fn from_env() -> CouchResult<Self> {
        let base_url = required_var("COUCH_BASE_URL")?;
        let database = required_var("COUCH_DB")?;

        let mut config = Self::new(base_url, database);
        if let (Ok(username), Ok(password)) = (env::var("COUCH_USERNAME"), env::var("COUCH_PASSWORD"))
        {
            config = config.with_credentials(username, password);
        }
        Ok(config)
    }
}

fn required_var(var: &'static str) -> CouchResult<String> {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(CouchDaoError::MissingEnvVar { var })
}
