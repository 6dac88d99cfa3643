//! Configuration module for the roster.
//!
//! Process configuration is loaded from environment variables with sensible defaults.
//! Remote-store configuration is a JSON blob entered by the admin or delivered via a
//! magic link, and is persisted in local storage.

use std::env;
use std::path::PathBuf;

use base64::{engine::general_purpose, Engine};
use serde_json::{Map, Value};

use crate::errors::RosterError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite file backing local storage
    pub db_path: PathBuf,
    /// Namespace for remote documents
    pub app_id: String,
    /// Password for the admin panel
    pub admin_password: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("ROSTER_DB_PATH")
            .unwrap_or_else(|_| "./data/roster.sqlite".to_string())
            .into();

        let app_id = env::var("ROSTER_APP_ID").unwrap_or_else(|_| "default-tour-app".to_string());

        let admin_password =
            env::var("ROSTER_ADMIN_PASSWORD").unwrap_or_else(|_| "admin888".to_string());

        let log_level = env::var("ROSTER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            db_path,
            app_id,
            admin_password,
            log_level,
        }
    }
}

/// Keys a remote config must carry as non-empty strings.
const REQUIRED_REMOTE_KEYS: [&str; 2] = ["apiKey", "projectId"];

/// Connection settings for the hosted document store.
///
/// Unknown keys are kept so the blob survives a round trip through a magic link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    fields: Map<String, Value>,
}

impl RemoteConfig {
    /// Parse and validate a JSON config blob.
    pub fn parse(json: &str) -> Result<Self, RosterError> {
        let value: Value = serde_json::from_str(json.trim()).map_err(|e| {
            RosterError::ConfigInvalid(format!(
                "Paste the cloud config JSON exactly as provided ({})",
                e
            ))
        })?;
        let Value::Object(fields) = value else {
            return Err(RosterError::ConfigInvalid(
                "Cloud config must be a JSON object".to_string(),
            ));
        };

        for key in REQUIRED_REMOTE_KEYS {
            let present = fields
                .get(key)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            if !present {
                return Err(RosterError::ConfigInvalid(format!(
                    "Cloud config is missing \"{}\"",
                    key
                )));
            }
        }

        Ok(Self { fields })
    }

    pub fn project_id(&self) -> &str {
        self.fields
            .get("projectId")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn to_json(&self) -> Result<String, RosterError> {
        Ok(serde_json::to_string(&self.fields)?)
    }

    /// Base64 of the JSON blob, as carried by the `setup` query parameter.
    pub fn to_setup_code(&self) -> Result<String, RosterError> {
        Ok(general_purpose::STANDARD.encode(self.to_json()?))
    }

    /// Decode a setup code. Accepts standard or URL-safe base64, with or without
    /// padding, and `+` that query parsing turned into spaces.
    pub fn from_setup_code(code: &str) -> Result<Self, RosterError> {
        let cleaned: String = code.trim().replace(' ', "+");
        let bytes = general_purpose::STANDARD
            .decode(&cleaned)
            .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(&cleaned))
            .or_else(|_| general_purpose::URL_SAFE.decode(&cleaned))
            .or_else(|_| general_purpose::URL_SAFE_NO_PAD.decode(&cleaned))?;
        let json = String::from_utf8(bytes).map_err(|_| {
            RosterError::ConfigInvalid("Setup code does not contain text".to_string())
        })?;
        Self::parse(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("ROSTER_DB_PATH");
        env::remove_var("ROSTER_APP_ID");
        env::remove_var("ROSTER_ADMIN_PASSWORD");
        env::remove_var("ROSTER_LOG_LEVEL");

        let config = Config::from_env();

        assert_eq!(config.db_path, PathBuf::from("./data/roster.sqlite"));
        assert_eq!(config.app_id, "default-tour-app");
        assert_eq!(config.admin_password, "admin888");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_remote_config_requires_keys() {
        let err = RemoteConfig::parse(r#"{"apiKey": "abc"}"#).unwrap_err();
        assert!(matches!(err, RosterError::ConfigInvalid(_)));

        let err = RemoteConfig::parse(r#"{"apiKey": "abc", "projectId": "  "}"#).unwrap_err();
        assert!(matches!(err, RosterError::ConfigInvalid(_)));

        assert!(RemoteConfig::parse("[1, 2]").is_err());
        assert!(RemoteConfig::parse("not json").is_err());
    }

    #[test]
    fn test_remote_config_keeps_extra_keys() {
        let config = RemoteConfig::parse(
            r#"{"apiKey": "abc", "projectId": "tour-1", "authDomain": "tour-1.example.com"}"#,
        )
        .unwrap();
        assert_eq!(config.project_id(), "tour-1");

        let reparsed: Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(reparsed["authDomain"], "tour-1.example.com");
    }

    #[test]
    fn test_setup_code_survives_query_mangling() {
        let config =
            RemoteConfig::parse(r#"{"apiKey": "a>b?c", "projectId": "tour-1"}"#).unwrap();
        let code = config.to_setup_code().unwrap();

        assert_eq!(RemoteConfig::from_setup_code(&code).unwrap(), config);
        // URLSearchParams-style decoding turns '+' into ' '
        let mangled = code.replace('+', " ");
        assert_eq!(RemoteConfig::from_setup_code(&mangled).unwrap(), config);
    }

    #[test]
    fn test_setup_code_rejects_garbage() {
        assert!(matches!(
            RemoteConfig::from_setup_code("%%%"),
            Err(RosterError::ConfigInvalid(_))
        ));
    }
}
