//! Error types for configuration and schedule fetching.
//!
//! The `Display` strings of [`FetchError`] are shown to the user verbatim,
//! so they are worded as messages rather than diagnostics.

use std::path::PathBuf;

use crate::zone::ZoneError;

/// A required setting is missing or invalid.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `zone` or `timer` is unset (or zero/blank).
    #[error("Incomplete configuration. Fill in all fields.")]
    Incomplete,

    /// No config file at the expected location.
    #[error(
        "no config found at {}\n\n\
         Create it with at least:\n\n\
         zone  = \"JHR04 - Batu Pahat, Muar, Segamat, Gemas Johor, Tangkak\"\n\
         timer = 10\n",
        .path.display()
    )]
    NotFound { path: PathBuf },

    /// The config file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::config::Config`].
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The zone descriptor did not parse.
    #[error("invalid zone: {0}")]
    Zone(#[from] ZoneError),
}

/// Why today's schedule could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The provider answered with a non-2xx status.
    #[error("API Error: {status} - {status_text}")]
    Api { status: u16, status_text: String },

    /// The request went out but nothing came back.
    #[error("Network Error: No response received from the server")]
    Network,

    /// The request could not be built or sent.
    #[error("Request Error: {0}")]
    Request(String),

    /// The response has no data for today or the zone.
    #[error("Invalid API response, please check zone configuration")]
    InvalidResponse,

    /// The response had a day entry but no usable events.
    #[error("No prayer time available from the API response")]
    EmptySchedule,
}
