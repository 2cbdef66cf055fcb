use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Loads service configuration from the environment. `dotenvy` should have
/// populated the process environment before this is called.
pub fn load() -> Result<Config> {
    Ok(Config {
        database: DatabaseConfig {
            url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
        },
        server: ServerConfig {
            port: std::env::var("PORT")
                .unwrap_or("3000".to_string())
                .parse()
                .context("PORT must be a valid port number")?,
        },
    })
}
