// crates/record-feed-cli/src/serve_policy.rs
// ============================================================================
// Module: Serve Policy
// Description: Network exposure policy checks for the CLI server launcher.
// Purpose: Enforce loopback-by-default bind behavior with explicit opt-in.
// Dependencies: record-feed-config, std
// ============================================================================

//! ## Overview
//! The record feed has no authentication, so binding beyond loopback needs an
//! explicit opt-in from the CLI flag, the environment, or the config file.

use std::env;
use std::net::SocketAddr;

use record_feed_config::ServerConfig;

/// Environment variable enabling non-loopback server binds.
pub const ALLOW_NON_LOOPBACK_ENV: &str = "RECORD_FEED_ALLOW_NON_LOOPBACK";

/// Bind outcome metadata for startup warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOutcome {
    /// Parsed bind address.
    pub bind_addr: SocketAddr,
    /// True when the server is bound to a non-loopback address.
    pub network_exposed: bool,
    /// Whether audit logging is enabled.
    pub audit_enabled: bool,
}

/// Serve policy failures for bind safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServePolicyError {
    /// Environment variable was set to an invalid value.
    InvalidEnv {
        /// Raw environment value.
        value: String,
    },
    /// Bind string failed to parse.
    InvalidBind {
        /// Raw bind value.
        bind: String,
        /// Parse error message.
        error: String,
    },
    /// Non-loopback binding requires explicit opt-in.
    NonLoopbackOptInRequired {
        /// Bind address.
        bind: String,
    },
}

impl std::fmt::Display for ServePolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEnv {
                value,
            } => write!(f, "{ALLOW_NON_LOOPBACK_ENV} must be true or false, got '{value}'"),
            Self::InvalidBind {
                bind,
                error,
            } => write!(f, "invalid bind address {bind}: {error}"),
            Self::NonLoopbackOptInRequired {
                bind,
            } => write!(
                f,
                "refusing non-loopback bind {bind}: pass --allow-non-loopback or set \
                 {ALLOW_NON_LOOPBACK_ENV}=1"
            ),
        }
    }
}

/// Resolves the non-loopback opt-in flag from CLI and environment.
///
/// # Errors
/// Returns [`ServePolicyError::InvalidEnv`] when the environment value is invalid.
pub fn resolve_allow_non_loopback(flag: bool) -> Result<bool, ServePolicyError> {
    if flag {
        return Ok(true);
    }
    let Some(value) = env::var_os(ALLOW_NON_LOOPBACK_ENV) else {
        return Ok(false);
    };
    let value = value.to_string_lossy().to_string();
    parse_allow_non_loopback_value(&value)
}

/// Enforces loopback-only binding unless explicitly allowed.
///
/// # Errors
/// Returns [`ServePolicyError`] when the bind is invalid or not permitted.
pub fn enforce_local_only(
    server: &ServerConfig,
    allow_non_loopback: bool,
) -> Result<BindOutcome, ServePolicyError> {
    let bind = server.bind.trim();
    let addr: SocketAddr =
        bind.parse().map_err(|err: std::net::AddrParseError| ServePolicyError::InvalidBind {
            bind: bind.to_string(),
            error: err.to_string(),
        })?;
    let network_exposed = !addr.ip().is_loopback();
    if network_exposed && !allow_non_loopback {
        return Err(ServePolicyError::NonLoopbackOptInRequired {
            bind: bind.to_string(),
        });
    }
    Ok(BindOutcome {
        bind_addr: addr,
        network_exposed,
        audit_enabled: server.audit.enabled,
    })
}

/// Parses a bool-ish string (true/false/1/0/yes/no/on/off).
fn parse_boolish(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parses an env value for allow-non-loopback.
fn parse_allow_non_loopback_value(value: &str) -> Result<bool, ServePolicyError> {
    parse_boolish(value).map_or_else(
        || {
            Err(ServePolicyError::InvalidEnv {
                value: value.to_string(),
            })
        },
        Ok,
    )
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        reason = "Test helpers use expect/expect_err for concise failure messages."
    )]

    use record_feed_config::ServerConfig;

    use super::ServePolicyError;
    use super::enforce_local_only;
    use super::parse_allow_non_loopback_value;

    fn server_with_bind(bind: &str) -> ServerConfig {
        ServerConfig {
            bind: bind.to_string(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn loopback_needs_no_opt_in() {
        let outcome = enforce_local_only(&server_with_bind("127.0.0.1:8080"), false)
            .expect("loopback bind");
        assert!(!outcome.network_exposed);
        assert_eq!(outcome.bind_addr.port(), 8080);
    }

    #[test]
    fn non_loopback_requires_opt_in() {
        let err = enforce_local_only(&server_with_bind("0.0.0.0:8080"), false)
            .expect_err("expected opt-in error");
        assert!(matches!(err, ServePolicyError::NonLoopbackOptInRequired { .. }));
    }

    #[test]
    fn non_loopback_with_opt_in_is_exposed() {
        let outcome =
            enforce_local_only(&server_with_bind("0.0.0.0:8080"), true).expect("opted in");
        assert!(outcome.network_exposed);
    }

    #[test]
    fn unparseable_bind_is_rejected() {
        let err = enforce_local_only(&server_with_bind("nowhere"), true)
            .expect_err("expected bind error");
        assert!(matches!(err, ServePolicyError::InvalidBind { .. }));
    }

    #[test]
    fn parse_allow_non_loopback_accepts_true() {
        let result = parse_allow_non_loopback_value("true").expect("parse env");
        assert!(result);
    }

    #[test]
    fn parse_allow_non_loopback_rejects_invalid() {
        let err = parse_allow_non_loopback_value("maybe").expect_err("expected invalid env");
        assert!(matches!(err, ServePolicyError::InvalidEnv { .. }));
    }
}
