//! Environment-driven service configuration.
//!
//! The two channel secrets are required; everything else has a default
//! or switches a feature off when absent.

use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 10000;

#[derive(Debug, Clone)]
pub struct Config {
    pub channel_secret: String,
    pub channel_access_token: String,
    pub bind: SocketAddr,
    /// Destination folder for uploaded images. Absent means echo-only
    /// mode: image messages get a fixed acknowledgment, no upload.
    pub drive_folder_id: Option<String>,
    pub line_api_base: Option<String>,
    pub line_data_base: Option<String>,
    pub drive_upload_base: Option<String>,
}

impl Config {
    /// Reads the process environment once at startup. A missing
    /// channel secret or access token is fatal before the socket is
    /// bound.
    pub fn from_env() -> Result<Self> {
        let channel_secret =
            env::var("LINE_CHANNEL_SECRET").context("LINE_CHANNEL_SECRET must be set")?;
        let channel_access_token = env::var("LINE_CHANNEL_ACCESS_TOKEN")
            .context("LINE_CHANNEL_ACCESS_TOKEN must be set")?;

        let bind = match env::var("BIND") {
            Ok(raw) => raw.parse().context("invalid BIND address")?,
            Err(_) => {
                let port = match env::var("PORT") {
                    Ok(raw) => raw.parse().context("invalid PORT")?,
                    Err(_) => DEFAULT_PORT,
                };
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        Ok(Self {
            channel_secret,
            channel_access_token,
            bind,
            drive_folder_id: env::var("DRIVE_FOLDER_ID").ok(),
            line_api_base: env::var("LINE_API_BASE").ok(),
            line_data_base: env::var("LINE_DATA_BASE").ok(),
            drive_upload_base: env::var("DRIVE_UPLOAD_BASE").ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_env() {
        for var in [
            "LINE_CHANNEL_SECRET",
            "LINE_CHANNEL_ACCESS_TOKEN",
            "BIND",
            "PORT",
            "DRIVE_FOLDER_ID",
            "LINE_API_BASE",
            "LINE_DATA_BASE",
            "DRIVE_UPLOAD_BASE",
        ] {
            unsafe { env::remove_var(var) };
        }
    }

    #[test]
    fn missing_channel_secret_is_fatal() {
        let _guard = env_lock().lock().unwrap();
        clear_env();
        unsafe { env::set_var("LINE_CHANNEL_ACCESS_TOKEN", "token") };

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("LINE_CHANNEL_SECRET"));
    }

    #[test]
    fn missing_access_token_is_fatal() {
        let _guard = env_lock().lock().unwrap();
        clear_env();
        unsafe { env::set_var("LINE_CHANNEL_SECRET", "secret") };

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("LINE_CHANNEL_ACCESS_TOKEN"));
    }

    #[test]
    fn defaults_apply_when_only_secrets_are_set() {
        let _guard = env_lock().lock().unwrap();
        clear_env();
        unsafe {
            env::set_var("LINE_CHANNEL_SECRET", "secret");
            env::set_var("LINE_CHANNEL_ACCESS_TOKEN", "token");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind, SocketAddr::from(([0, 0, 0, 0], 10000)));
        assert!(config.drive_folder_id.is_none());
        assert!(config.line_api_base.is_none());
    }

    #[test]
    fn port_and_folder_are_read() {
        let _guard = env_lock().lock().unwrap();
        clear_env();
        unsafe {
            env::set_var("LINE_CHANNEL_SECRET", "secret");
            env::set_var("LINE_CHANNEL_ACCESS_TOKEN", "token");
            env::set_var("PORT", "8123");
            env::set_var("DRIVE_FOLDER_ID", "folder-1");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind.port(), 8123);
        assert_eq!(config.drive_folder_id.as_deref(), Some("folder-1"));
    }

    #[test]
    fn bind_overrides_port() {
        let _guard = env_lock().lock().unwrap();
        clear_env();
        unsafe {
            env::set_var("LINE_CHANNEL_SECRET", "secret");
            env::set_var("LINE_CHANNEL_ACCESS_TOKEN", "token");
            env::set_var("BIND", "127.0.0.1:9999");
            env::set_var("PORT", "8123");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind, "127.0.0.1:9999".parse().unwrap());
    }
}
