//! CLI configuration from environment variables.
//!
//! Every value is optional except where a command needs it. Command-line
//! flags take precedence over the environment.

use dcert_core::IssuerId;

/// Default size of the Postgres connection pool.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Settings shared by all subcommands.
///
/// Custom `Debug` implementation redacts `database_url`, which usually
/// carries a password.
#[derive(Clone)]
pub struct CliConfig {
    /// Postgres connection string. Store commands fail without it.
    pub database_url: Option<String>,
    /// Account that issued certificates are recorded under.
    pub issuer_id: Option<IssuerId>,
    /// Default issuer display name.
    pub issuer_name: Option<String>,
    /// Default issuer organization.
    pub issuer_organization: Option<String>,
    pub db_max_connections: u32,
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("issuer_id", &self.issuer_id)
            .field("issuer_name", &self.issuer_name)
            .field("issuer_organization", &self.issuer_organization)
            .field("db_max_connections", &self.db_max_connections)
            .finish()
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            issuer_id: None,
            issuer_name: None,
            issuer_organization: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `DATABASE_URL` (optional)
    /// - `DCERT_ISSUER_ID` (optional, UUID)
    /// - `DCERT_ISSUER_NAME` (optional)
    /// - `DCERT_ISSUER_ORG` (optional)
    /// - `DCERT_DB_MAX_CONNECTIONS` (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup. Blank values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let issuer_id = match get("DCERT_ISSUER_ID") {
            Some(raw) => Some(raw.parse::<IssuerId>().map_err(|e| {
                ConfigError::InvalidIssuerId {
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };

        let db_max_connections = match get("DCERT_DB_MAX_CONNECTIONS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: "DCERT_DB_MAX_CONNECTIONS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            issuer_id,
            issuer_name: get("DCERT_ISSUER_NAME"),
            issuer_organization: get("DCERT_ISSUER_ORG"),
            db_max_connections,
        })
    }

    /// Apply command-line overrides.
    pub fn with_database_url(mut self, url: Option<String>) -> Self {
        if url.is_some() {
            self.database_url = url;
        }
        self
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DCERT_ISSUER_ID is not a valid UUID ({value}): {reason}")]
    InvalidIssuerId { value: String, reason: String },
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}
