use crate::error::GateError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Minimum length the cookie key derivation accepts.
pub const MIN_SECRET_LEN: usize = 32;

const DEFAULT_SESSION_SECRET: &str = "roster-gate-development-session-secret";

/// One day; bounds how long abandoned sessions stay in the store.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

/// Reject secrets too short to derive the cookie key from.
pub fn check_session_secret(secret: &str) -> Result<(), GateError> {
    let actual = secret.len();
    if actual < MIN_SECRET_LEN {
        return Err(GateError::WeakSessionSecret {
            min: MIN_SECRET_LEN,
            actual,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// Fixed in-process table built from the roster.
    Static,
    /// `accounts` table, seeded once from the roster.
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub session_secret: String,
    pub credential_backend: CredentialBackend,
    pub session_backend: SessionBackend,
    pub session_ttl_secs: Option<u64>,
    pub session_cleanup_secs: u64,
    pub cookie_secure: bool,
    pub public_dir: PathBuf,
    pub roster_path: Option<PathBuf>,
    pub loglevel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            database_url: "sqlite://roster-gate.sqlite".to_string(),
            session_secret: DEFAULT_SESSION_SECRET.to_string(),
            credential_backend: CredentialBackend::Sqlite,
            session_backend: SessionBackend::Memory,
            session_ttl_secs: Some(DEFAULT_SESSION_TTL_SECS),
            session_cleanup_secs: 300,
            cookie_secure: false,
            public_dir: PathBuf::from("public"),
            roster_path: None,
            loglevel: "info".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then `config.toml`, then `GATE_*` variables, then bare `PORT`.
    pub fn load() -> Result<Self, GateError> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file("config.toml"))
                .merge(Env::prefixed("GATE_"))
                .merge(Env::raw().only(&["PORT"])),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, GateError> {
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), GateError> {
        check_session_secret(&self.session_secret)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, GateError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| GateError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))
    }
}
