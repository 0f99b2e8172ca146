//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;

use thiserror::Error;

use invoicedesk_infra::DeletePolicy;
use invoicedesk_observability::LogFormat;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_SESSION_SECRET: &str = "dev-session-secret";
const DEFAULT_SESSION_TTL_MINUTES: i64 = 60;
const MAX_SESSION_TTL_MINUTES: i64 = 366 * 24 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` runs on in-memory stores seeded with demo data.
    pub database_url: Option<String>,
    pub session_secret: String,
    pub session_ttl: chrono::Duration,
    pub delete_policy: DeletePolicy,
    pub log_format: LogFormat,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("session_secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("delete_policy", &self.delete_policy)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source (the process environment in `from_env`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", format!("{e}")))?;

        let session_secret = get("SESSION_SECRET").unwrap_or_else(|| DEV_SESSION_SECRET.to_string());

        let ttl_minutes = match get("SESSION_TTL_MINUTES") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(m) if (1..=MAX_SESSION_TTL_MINUTES).contains(&m) => m,
                _ => {
                    return Err(ConfigError::invalid(
                        "SESSION_TTL_MINUTES",
                        format!("expected an integer between 1 and {MAX_SESSION_TTL_MINUTES}, got {raw:?}"),
                    ));
                }
            },
            None => DEFAULT_SESSION_TTL_MINUTES,
        };
        let session_ttl = chrono::Duration::try_minutes(ttl_minutes)
            .ok_or_else(|| ConfigError::invalid("SESSION_TTL_MINUTES", "duration out of range"))?;

        let delete_policy = match get("ALLOW_INVOICE_DELETE").as_deref() {
            None => DeletePolicy::Guarded,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => DeletePolicy::Enabled,
                "false" | "0" | "no" => DeletePolicy::Guarded,
                _ => return Err(ConfigError::invalid("ALLOW_INVOICE_DELETE", format!("expected true or false, got {raw:?}"))),
            },
        };

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|e| ConfigError::invalid("LOG_FORMAT", format!("{e}")))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            session_secret,
            session_ttl,
            delete_policy,
            log_format,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.session_secret == DEV_SESSION_SECRET
    }

    /// In-memory configuration for tests and local runs.
    pub fn for_tests(session_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], 0).into(),
            database_url: None,
            session_secret: session_secret.into(),
            session_ttl: chrono::Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            delete_policy: DeletePolicy::Guarded,
            log_format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.session_ttl, chrono::Duration::minutes(60));
        assert_eq!(cfg.delete_policy, DeletePolicy::Guarded);
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert!(cfg.uses_dev_secret());
    }

    #[test]
    fn explicit_values_are_honored() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:3000"),
            ("DATABASE_URL", "postgres://localhost/invoices"),
            ("SESSION_SECRET", "s3cret"),
            ("SESSION_TTL_MINUTES", "15"),
            ("ALLOW_INVOICE_DELETE", "TRUE"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/invoices"));
        assert_eq!(cfg.session_secret, "s3cret");
        assert_eq!(cfg.session_ttl, chrono::Duration::minutes(15));
        assert_eq!(cfg.delete_policy, DeletePolicy::Enabled);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn malformed_values_name_the_variable() {
        for (var, value) in [
            ("BIND_ADDR", "not-an-addr"),
            ("SESSION_TTL_MINUTES", "0"),
            ("SESSION_TTL_MINUTES", "soon"),
            ("SESSION_TTL_MINUTES", "9223372036854775807"),
            ("SESSION_TTL_MINUTES", "100000000000000"),
            ("SESSION_TTL_MINUTES", "527041"),
            ("ALLOW_INVOICE_DELETE", "maybe"),
            ("LOG_FORMAT", "xml"),
        ] {
            let err = config(&[(var, value)]).unwrap_err();
            let ConfigError::Invalid { var: named, .. } = &err;
            assert_eq!(*named, var, "{err}");
        }
    }

    #[test]
    fn session_ttl_accepts_up_to_a_leap_year() {
        let cfg = config(&[("SESSION_TTL_MINUTES", "527040")]).unwrap();
        assert_eq!(cfg.session_ttl, chrono::Duration::days(366));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let mut cfg = AppConfig::for_tests("top-secret");
        cfg.database_url = Some("postgres://user:pw@db/app".to_string());
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("top-secret"));
        assert!(!printed.contains("pw@db"));
    }
}
