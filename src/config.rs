//! Configuration from the environment
//!
//! Every setting has a default, empty values count as unset

use std::net::SocketAddr;

use thiserror::Error;

use crate::crypto::Crypto;
use crate::crypto::DEFAULT_ITERATIONS;
use crate::locale::Locale;
use crate::utils::non_empty;

pub const DEFAULT_ADDRESS: &str = "0.0.0.0:6000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://notebox.db?mode=rwc";

/// `DATABASE_URL` value selecting the in-memory store
pub const MEMORY_DATABASE_URL: &str = "memory";

/// Configuration errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid `{name}`: {message}")]
    Invalid { name: &'static str, message: String },
}

impl Error {
    fn invalid<M>(name: &'static str, message: M) -> Self
    where
        M: ToString,
    {
        Error::Invalid {
            name,
            message: message.to_string(),
        }
    }
}

/// Notebox settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Where the snapshot service listens
    pub address: SocketAddr,

    /// SQLite URL of the snapshot store, or `memory`
    pub database_url: String,

    /// PBKDF2 rounds for private notes
    pub kdf_iterations: u32,

    /// Language of system category names and placeholders
    pub locale: Locale,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([0, 0, 0, 0], 6000)),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            kdf_iterations: DEFAULT_ITERATIONS,
            locale: Locale::default(),
        }
    }
}

impl Config {
    /// Read the configuration from the process environment
    ///
    /// # Errors
    ///
    /// Will return `Err` when a set value can not be parsed
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through a lookup function
    ///
    /// # Errors
    ///
    /// Will return `Err` when a set value can not be parsed
    pub fn from_lookup<L>(lookup: L) -> Result<Self, Error>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut address = non_empty(lookup("ADDRESS"))
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string())
            .parse::<SocketAddr>()
            .map_err(|err| Error::invalid("ADDRESS", err))?;

        // optional override of just the port
        if let Some(port) = non_empty(lookup("PORT")) {
            let port = port
                .parse::<u16>()
                .map_err(|err| Error::invalid("PORT", err))?;

            address.set_port(port);
        }

        let database_url =
            non_empty(lookup("DATABASE_URL")).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let kdf_iterations = non_empty(lookup("KDF_ITERATIONS"))
            .map(|iterations| iterations.parse::<u32>())
            .transpose()
            .map_err(|err| Error::invalid("KDF_ITERATIONS", err))?
            .unwrap_or(DEFAULT_ITERATIONS);

        let locale = non_empty(lookup("LOCALE"))
            .map(|locale| locale.parse::<Locale>())
            .transpose()
            .map_err(|err| Error::invalid("LOCALE", err))?
            .unwrap_or_default();

        Ok(Self {
            address,
            database_url,
            kdf_iterations,
            locale,
        })
    }

    /// Crypto with the configured work factor, never below the minimum
    pub fn crypto(&self) -> Crypto {
        Crypto::new(self.kdf_iterations)
    }

    /// Should the snapshots only be kept in memory?
    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}
