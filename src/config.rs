//! Configuration for the Telegram downloader
//!
//! Loads the INI config file: an `[Access]` section holding the session
//! name and API credentials, and a `[Client]` section with connection
//! parameters. All keys are required; there are no baked-in credentials.

use std::path::Path;

use ini::{Ini, Properties};

use crate::error::{Error, Result};

/// Default config filename, next to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.ini";
pub const SESSION_SUFFIX: &str = ".session";
pub const LOCK_SUFFIX: &str = ".lock";

/// `[Access]` section: session name and API credentials
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Session name; the file on disk is `{session}.session`
    pub session: String,
    pub api_id: i32,
    pub api_hash: String,
}

/// `[Client]` section: connection parameters
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Connect/authorization timeout in seconds
    pub timeout: u64,
    pub device_model: String,
    pub lang_code: String,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub access: AccessConfig,
    pub client: ClientConfig,
}

impl Config {
    /// Load configuration from an INI file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigError(format!(
                "Not found: {}",
                path.display()
            )));
        }

        let ini = Ini::load_from_file(path).map_err(|e| {
            Error::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        let access = section(&ini, "Access")?;
        let client = section(&ini, "Client")?;

        let api_id = parse_int::<i32>(get(access, "Access", "id")?, "Access.id")?;
        let timeout = parse_int::<u64>(get(client, "Client", "timeout")?, "Client.timeout")?;

        Ok(Self {
            access: AccessConfig {
                session: get(access, "Access", "session")?.to_string(),
                api_id,
                api_hash: get(access, "Access", "hash")?.to_string(),
            },
            client: ClientConfig {
                timeout,
                device_model: get(client, "Client", "device_model")?.to_string(),
                lang_code: get(client, "Client", "lang_code")?.to_string(),
            },
        })
    }

    /// Session file on disk, e.g. `my_account.session`
    pub fn session_file(&self) -> String {
        format!("{}{}", self.access.session, SESSION_SUFFIX)
    }

    /// Lock file guarding the session against parallel runs
    pub fn lock_file(&self) -> String {
        format!("{}{}", self.access.session, LOCK_SUFFIX)
    }
}

fn section<'a>(ini: &'a Ini, name: &str) -> Result<&'a Properties> {
    ini.section(Some(name))
        .ok_or_else(|| Error::ConfigError(format!("Missing section [{}]", name)))
}

fn get<'a>(props: &'a Properties, section_name: &str, key: &str) -> Result<&'a str> {
    props
        .get(key)
        .ok_or_else(|| Error::ConfigError(format!("Missing key {}.{}", section_name, key)))
}

fn parse_int<T: std::str::FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| Error::ConfigError(format!("{} must be an integer, got {:?}", what, value)))
}
