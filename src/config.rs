use anyhow::{Context, Result};
use clap::Parser;
use std::env;

const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    pub public_base_url: String,
    pub max_upload_bytes: u64,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Drag & drop file upload service")]
pub struct Args {
    /// Host to bind to (overrides DROPZONE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides DROPZONE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where uploaded files are stored (overrides DROPZONE_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides DROPZONE_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Origin used to build file URLs (overrides DROPZONE_PUBLIC_BASE_URL)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Largest accepted upload in bytes (overrides DROPZONE_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<u64>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args)?, migrate))
    }

    /// Merge parsed CLI args over environment values and defaults.
    pub fn merge(args: Args) -> Result<Self> {
        let env_host = env::var("DROPZONE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_env("DROPZONE_PORT", 3000u16)?;
        let env_storage =
            env::var("DROPZONE_STORAGE_DIR").unwrap_or_else(|_| "./data/storage".into());
        let env_db = env::var("DROPZONE_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/dropzone.db".into());
        let env_public = env::var("DROPZONE_PUBLIC_BASE_URL").ok();
        let env_max_upload = parse_env("DROPZONE_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        let host = args.host.unwrap_or(env_host);
        let port = args.port.unwrap_or(env_port);
        let public_base_url = args
            .public_base_url
            .or(env_public)
            .unwrap_or_else(|| default_public_base_url(&host, port));

        Ok(Self {
            host,
            port,
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            public_base_url,
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}

/// Wildcard bind addresses are not reachable by browsers, so URLs point at
/// localhost instead.
fn default_public_base_url(host: &str, port: u16) -> String {
    let host = match host {
        "0.0.0.0" | "::" | "[::]" => "localhost",
        other => other,
    };
    format!("http://{}:{}", host, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_args_override_everything() {
        let args = Args {
            host: Some("127.0.0.1".into()),
            port: Some(8080),
            storage_dir: Some("/srv/files".into()),
            database_url: Some("sqlite::memory:".into()),
            public_base_url: Some("https://files.example.com".into()),
            max_upload_bytes: Some(10),
            migrate: false,
        };
        let cfg = AppConfig::merge(args).unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:8080");
        assert_eq!(cfg.storage_dir, "/srv/files");
        assert_eq!(cfg.public_base_url, "https://files.example.com");
        assert_eq!(cfg.max_upload_bytes, 10);
    }

    #[test]
    fn wildcard_host_maps_to_localhost_url() {
        assert_eq!(
            default_public_base_url("0.0.0.0", 3000),
            "http://localhost:3000"
        );
        assert_eq!(
            default_public_base_url("files.internal", 80),
            "http://files.internal:80"
        );
    }
}
