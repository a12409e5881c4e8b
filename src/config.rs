use anyhow::Context;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    /// Admin profile stamped on rows written by this process.
    pub admin_id: Option<Uuid>,
    pub session_ttl_minutes: i64,
    pub poll_interval_secs: u64,
}

impl Settings {
    /// Reads settings from the environment (`DATABASE_URL`, `ADMIN_ID`, ...).
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_source(::config::Environment::default().try_parsing(true))
    }

    fn from_source<S>(source: S) -> anyhow::Result<Self>
    where
        S: ::config::Source + Send + Sync + 'static,
    {
        ::config::Config::builder()
            .set_default("max_connections", 5)?
            .set_default("session_ttl_minutes", 60)?
            .set_default("poll_interval_secs", 30)?
            .add_source(source)
            .build()?
            .try_deserialize()
            .context("DATABASE_URL must be set to a production Postgres instance")
    }
}
