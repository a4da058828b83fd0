use std::{env, fmt::Display, io, path::PathBuf, str::FromStr};

use bytesize::ByteSize;
use log::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    pub database_url: String,
    pub upload_dir: PathBuf,
    /// seconds a session token stays valid after login
    pub session_expiry: i64,
    pub max_upload: ByteSize,
}

impl Config {
    pub fn load() -> io::Result<Self> {
        Ok(Self {
            bind_address: try_load("BIND_ADDRESS", "0.0.0.0")?,
            port: try_load("PORT", "3000")?,
            database_url: try_load("DATABASE_URL", "sqlite://photo_share.sqlite?mode=rwc")?,
            upload_dir: try_load("UPLOAD_DIR", "images")?,
            // 7 days
            session_expiry: try_load("SESSION_EXPIRY_SECS", "604800")?,
            max_upload: try_load("MAX_UPLOAD", "50 MiB")?,
        })
    }
}

#[cfg(test)]
impl Config {
    /// Defaults, with uploads going to a fresh temporary directory.
    pub fn for_tests() -> Self {
        let dir = format!("photo_share_{}", &crate::util::generate_token()[..12]);

        Self {
            bind_address: "127.0.0.1".into(),
            port: 0,
            database_url: "sqlite::memory:".into(),
            upload_dir: env::temp_dir().join(dir),
            session_expiry: 60 * 60,
            max_upload: ByteSize::kib(64),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> io::Result<T>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e| {
        warn!("Invalid {key} value {value:?}: {e}");
        io::Error::new(io::ErrorKind::InvalidInput, format!("{key}: {e}"))
    })
}
