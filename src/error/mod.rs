use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for authgate
///
/// Expected negative outcomes (wrong password, unknown user, absent or
/// expired session, stale remember token) are never represented here; they
/// are `false`/`None` return values. Errors are reserved for wiring
/// mistakes and backend failures.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Session error: {0}")]
    Session(String),

    /// Store backend unreachable or misbehaving. Distinct from "session not
    /// found" so an outage is surfaced as a 5xx instead of masquerading as
    /// an anonymous user.
    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    /// Wiring mistake: unregistered guard/provider name, auth without
    /// session middleware, and similar. Fatal at setup or first use.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Redis pool setup failure (bad URL, pool creation)
    #[cfg(feature = "redis")]
    #[error("Redis pool error: {0}")]
    RedisPool(String),
}

#[cfg(feature = "redis")]
impl From<deadpool_redis::CreatePoolError> for Error {
    fn from(err: deadpool_redis::CreatePoolError) -> Self {
        Self::RedisPool(format!("Pool creation error: {}", err))
    }
}

impl Error {
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn hash(msg: impl Into<String>) -> Self {
        Self::Hash(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Session(_) => "E_SESSION",
            Error::StoreUnavailable(_) => "E_STORE_UNAVAILABLE",
            Error::Config(_) => "E_CONFIG",
            Error::Hash(_) => "E_HASH",
            Error::Json(_) => "E_JSON",
            Error::Internal(_) => "E_INTERNAL",
            #[cfg(feature = "redis")]
            Error::RedisPool(_) => "E_REDIS_POOL",
        }
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::StoreUnavailable(_) => 503,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_unavailable_maps_to_503() {
        let err = Error::store_unavailable("redis down");
        assert_eq!(err.status_code(), 503);
        assert_eq!(err.error_code(), "E_STORE_UNAVAILABLE");
    }

    #[test]
    fn test_config_error_is_500() {
        let err = Error::config("guard 'api' is not registered");
        assert_eq!(err.status_code(), 500);
    }
}
