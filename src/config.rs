use clap::Parser;

/// Server settings. Every flag falls back to an environment variable so the
/// service can be configured entirely through `.env`.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "RBAC administration API", long_about = None)]
pub struct ServerConfig {
    /// SQLite connection string, e.g. `sqlite://rbac.db?mode=rwc`
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[arg(long, env = "APP_PORT", default_value_t = 8000)]
    pub port: u16,

    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,
}

impl ServerConfig {
    pub fn load() -> Self {
        load_env();
        Self::parse()
    }
}

/// Load `.env` from the working directory, falling back to the crate directory
/// when the binary runs from elsewhere (containers).
pub fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}
