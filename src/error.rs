/*
 * Error Module
 *
 * Error types surfaced by the environment. Load and malformed-asset failures
 * are reported to the notification sink at the admission boundary; they never
 * stop the frame loop. Capacity overflow is not an error: the population
 * evicts its oldest creature instead.
 */

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// The asset could not be fetched at all
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read asset `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {after:?} loading `{path}`")]
    Timeout { path: String, after: Duration },

    #[error("asset worker for `{path}` could not be started: {source}")]
    Worker {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// The asset was fetched but does not carry the scene graph creatures need
#[derive(Debug, Error)]
#[error("asset `{path}` is malformed: {reason}")]
pub struct AssetMalformedError {
    pub path: String,
    pub reason: String,
}

impl AssetMalformedError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

// Anything that prevents a descriptor from becoming a live creature
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Malformed(#[from] AssetMalformedError),
}

impl SpawnError {
    pub fn path(&self) -> &str {
        match self {
            SpawnError::Load(LoadError::Io { path, .. })
            | SpawnError::Load(LoadError::Timeout { path, .. })
            | SpawnError::Load(LoadError::Worker { path, .. }) => path,
            SpawnError::Malformed(err) => &err.path,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SpawnError::Load(LoadError::Timeout { .. }))
    }

    // Same failure for another request that waited on the same fetch
    pub fn replicate(&self) -> SpawnError {
        let copy_io = |err: &std::io::Error| std::io::Error::new(err.kind(), err.to_string());
        match self {
            SpawnError::Load(LoadError::Io { path, source }) => LoadError::Io {
                path: path.clone(),
                source: copy_io(source),
            }
            .into(),
            SpawnError::Load(LoadError::Timeout { path, after }) => LoadError::Timeout {
                path: path.clone(),
                after: *after,
            }
            .into(),
            SpawnError::Load(LoadError::Worker { path, source }) => LoadError::Worker {
                path: path.clone(),
                source: copy_io(source),
            }
            .into(),
            SpawnError::Malformed(err) => AssetMalformedError::new(err.path.clone(), err.reason.clone()).into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("invalid parameter `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed transport message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("transport is closed")]
    Closed,
}
