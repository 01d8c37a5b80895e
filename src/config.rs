use std::env;

use serde::Deserialize;

/// Prefix of every upload UID; the session start time in unix millis follows it.
pub const UID_PREFIX: &str = "fileapi";

/// Size of the body pieces handed to the HTTP client (64 KB). One progress
/// event is emitted per piece.
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Idle keep-alive connections kept per endpoint host.
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 8;

/// Top-level configuration for the HTTP uploader.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Granularity of upload progress, in bytes.
    pub stream_chunk_size: usize,
    /// `User-Agent` sent with every upload request.
    pub user_agent: String,
    /// Maximum idle pooled connections per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            stream_chunk_size: DEFAULT_STREAM_CHUNK_SIZE,
            user_agent: format!("upload-engine/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
        }
    }
}

impl UploadConfig {
    /// Read overrides from `UPLOAD_STREAM_CHUNK_SIZE`, `UPLOAD_USER_AGENT` and
    /// `UPLOAD_POOL_MAX_IDLE`. Missing or unparsable values keep the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            stream_chunk_size: env::var("UPLOAD_STREAM_CHUNK_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &usize| *v > 0)
                .unwrap_or(defaults.stream_chunk_size),
            user_agent: env::var("UPLOAD_USER_AGENT")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            pool_max_idle_per_host: env::var("UPLOAD_POOL_MAX_IDLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.pool_max_idle_per_host),
        }
    }
}
