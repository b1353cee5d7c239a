use std::{env, fmt, path::PathBuf};

use reqwest::Url;
use thiserror::Error;

/// Fallback backend origin used when running locally without `BACKEND_URL`.
const LOCAL_BACKEND_URL: &str = "http://localhost:8080";

/// AppConfig
///
/// Holds the process-wide configuration. It is loaded once at startup and is
/// immutable afterwards; every component (the access gate, the backend client,
/// the static file service) receives the values it needs from here instead of
/// reading the environment on its own.
#[derive(Clone)]
pub struct AppConfig {
    // Runtime environment marker. Controls the log format and which variables are mandatory.
    pub env: Env,
    // HMAC key used to verify the `token` cookie. Never logged.
    pub jwt_secret: String,
    // Origin of the external delivery backend the /api routes forward to.
    pub backend_url: Url,
    // Directory holding the compiled dashboard bundle (index.html + assets).
    pub static_dir: PathBuf,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
}

/// Env
///
/// Defines the runtime context: `Local` for development (pretty logs, backend
/// fallback) and `Production` (JSON logs, every variable explicit).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// ConfigError
///
/// Raised by `AppConfig::load`. Any of these aborts startup: the service never
/// runs with a missing or unusable signing secret.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("jwt_secret", &"<redacted>")
            .field("backend_url", &self.backend_url.as_str())
            .field("static_dir", &self.static_dir)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a non-panicking AppConfig for test setup, so tests can build
    /// application state without touching process environment variables.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            backend_url: Url::parse(LOCAL_BACKEND_URL).expect("static URL literal is valid"),
            static_dir: PathBuf::from("public"),
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the configuration at startup.
    /// Reads every parameter from environment variables and fails fast.
    ///
    /// # Errors
    /// `JWT_SECRET` is mandatory in every environment; `BACKEND_URL` is
    /// mandatory in production. A malformed `BACKEND_URL` is rejected.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        // Fail closed: there is no fallback secret, not even locally.
        let jwt_secret =
            raw_non_blank_var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let backend_url = match (env, non_empty_var("BACKEND_URL")) {
            (_, Some(url)) => url,
            (Env::Local, None) => LOCAL_BACKEND_URL.to_string(),
            (Env::Production, None) => return Err(ConfigError::Missing("BACKEND_URL")),
        };
        let backend_url = parse_backend_url(&backend_url)?;

        Ok(Self {
            env,
            jwt_secret,
            backend_url,
            static_dir: non_empty_var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            bind_addr: non_empty_var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Like `non_empty_var`, but keeps the value byte for byte. Used for the
/// signing secret, which must match the issuer's key exactly.
fn raw_non_blank_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name: "BACKEND_URL",
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::Invalid {
            name: "BACKEND_URL",
            reason: "must be an absolute http(s) URL".to_string(),
        });
    }

    Ok(url)
}
