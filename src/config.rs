use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub registration: RegistrationMode,
    pub max_upload_size: usize,
    pub media_root: PathBuf,
    pub export_dir: PathBuf,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationMode {
    Open,
    Closed,
}

/// Upload limit applied to artifact files when nothing is configured (10 MB).
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("DEVTRACKER_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid DEVTRACKER_HOST: {e}"))?;

        let port: u16 = env_or("DEVTRACKER_PORT", "8000")
            .parse()
            .map_err(|e| format!("Invalid DEVTRACKER_PORT: {e}"))?;

        let base_url = env_or("DEVTRACKER_BASE_URL", &format!("http://{host}:{port}"));

        let registration = match env_or("DEVTRACKER_REGISTRATION", "open").as_str() {
            "closed" => RegistrationMode::Closed,
            _ => RegistrationMode::Open,
        };

        let max_upload_size: usize =
            env_or("DEVTRACKER_MAX_UPLOAD_SIZE", &DEFAULT_MAX_UPLOAD_SIZE.to_string())
                .parse()
                .map_err(|e| format!("Invalid DEVTRACKER_MAX_UPLOAD_SIZE: {e}"))?;

        let media_root = PathBuf::from(env_or("DEVTRACKER_MEDIA_ROOT", "media"));
        let export_dir = PathBuf::from(env_or("DEVTRACKER_EXPORT_DIR", "exports"));

        let log_level = env_or("DEVTRACKER_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            registration,
            max_upload_size,
            media_root,
            export_dir,
            log_level,
        })
    }

    /// Cookies only get the `Secure` flag when the site is served over TLS.
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Settings the command-line tools need; they never touch auth, so
/// `JWT_SECRET` is not required here.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub database_url: String,
    pub export_dir: PathBuf,
    pub log_level: String,
}

impl CliConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(CliConfig {
            database_url: env_required("DATABASE_URL")?,
            export_dir: PathBuf::from(env_or("DEVTRACKER_EXPORT_DIR", "exports")),
            log_level: env_or("DEVTRACKER_LOG_LEVEL", "info"),
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
