//! Error types for the vouch system
//!
//! Subsystems surface structured errors through this enum; the operations
//! layer wraps them with `anyhow` context on the way out. The split matters
//! operationally: transient platform failures are retried inside the client,
//! permanent ones and configuration problems never are.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VouchError {
    /// A required identifier or credential was not supplied
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Platform kept returning 5xx through every backoff attempt
    #[error("platform request failed after {attempts} attempts: {method} {endpoint} returned {status}")]
    TransientPlatform {
        method: String,
        endpoint: String,
        status: u16,
        attempts: u32,
    },

    /// Platform rejected the request outright (4xx); retrying cannot help
    #[error("platform rejected request: {method} {endpoint} returned {status}: {message}")]
    PermanentPlatform {
        method: String,
        endpoint: String,
        status: u16,
        message: String,
    },

    /// Network-level failure talking to the platform
    #[error("platform request error: {method} {endpoint}")]
    Network {
        method: String,
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Trust file absent on a read/check path (mutation paths auto-initialize)
    #[error("trust file not found at {path}")]
    MissingTrustFile { path: PathBuf },

    /// Push kept losing the race against concurrent writers. The message
    /// names the last underlying failure; the caller's logical action did
    /// not complete.
    #[error("failed to push trust file update after {attempts} attempts: {last}")]
    DivergedPush { attempts: u32, last: anyhow::Error },

    /// A git subprocess failed for a reason other than push divergence
    #[error("git {operation} failed: {stderr}")]
    Git { operation: String, stderr: String },
}
