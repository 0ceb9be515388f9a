use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::mail::service::DEFAULT_SENDER;

/// SMTP connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// Implicit TLS from the first byte. Otherwise STARTTLS is used when offered.
    pub secure: bool,
    pub user: Option<String>,
    pub pass: Option<String>,
    /// When false, self-signed and otherwise invalid certificates are accepted.
    pub reject_unauthorized: bool,
}

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub smtp: SmtpSettings,
    pub mail_from: String,
    pub template_dir: PathBuf,
    pub public_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            smtp: SmtpSettings {
                host: env_or("SMTP_HOST", "sandbox.smtp.mailtrap.io"),
                port: parse_port("SMTP_PORT", &env_or("SMTP_PORT", "2525"))?,
                secure: parse_bool("SMTP_SECURE", &env_or("SMTP_SECURE", "false"))?,
                user: optional_env("SMTP_USER"),
                pass: optional_env("SMTP_PASS"),
                reject_unauthorized: parse_bool(
                    "SMTP_TLS_REJECT_UNAUTHORIZED",
                    &env_or("SMTP_TLS_REJECT_UNAUTHORIZED", "false"),
                )?,
            },
            mail_from: env_or("MAIL_FROM", DEFAULT_SENDER),
            template_dir: PathBuf::from(env_or("TEMPLATE_DIR", "templates")),
            public_dir: PathBuf::from(env_or("PUBLIC_DIR", "public")),
            port: parse_port("PORT", &env_or("PORT", "3000"))?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Unset and blank variables are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_port(key: &str, raw: &str) -> Result<u16> {
    raw.parse::<u16>()
        .with_context(|| format!("{key} must be a valid port number, got '{raw}'"))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{key} must be true or false, got '{raw}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_accepts_common_spellings() {
        assert!(parse_bool("X", "true").unwrap());
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(parse_bool("X", "1").unwrap());
        assert!(!parse_bool("X", "false").unwrap());
        assert!(!parse_bool("X", "off").unwrap());
    }

    #[test]
    fn test_parse_bool_rejects_garbage() {
        let err = parse_bool("SMTP_SECURE", "maybe").unwrap_err();
        assert!(err.to_string().contains("SMTP_SECURE"));
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("PORT", "3000").unwrap(), 3000);
        let err = parse_port("SMTP_PORT", "70000").unwrap_err();
        assert!(err.to_string().contains("SMTP_PORT"));
        assert!(parse_port("PORT", "abc").is_err());
    }
}
