use std::env;

use crate::errors::ConfigError;

pub const DEFAULT_DATABASE: &str = "OpenSplit";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Clone, Debug, PartialEq)]
pub enum Storage {
    Mongo { uri: String },
    Memory,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub storage: Storage,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `lookup`, so tests need not touch the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage = match lookup("OPENSPLIT_STORAGE").as_deref() {
            None | Some("mongo") => Storage::Mongo {
                uri: lookup("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?,
            },
            Some("memory") => Storage::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "OPENSPLIT_STORAGE",
                    value: other.to_string(),
                })
            }
        };
        let port = match lookup("OPENSPLIT_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "OPENSPLIT_PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };
        Ok(Config {
            storage,
            database: lookup("OPENSPLIT_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.into()),
            host: lookup("OPENSPLIT_HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port,
        })
    }
}
