// Runtime configuration: environment (optionally from `.env`) first, then
// command-line flags on top.
//
// **Environment Variables:**
// - `GOOGLE_API_KEY` - API key used to load the Drive discovery document
// - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` - OAuth client for the device flow
// - `GOOGLE_SERVICE_ACCOUNT_KEY` - Path to a service account JSON key
// - `GOOGLE_SERVICE_ACCOUNT_JSON` - Service account JSON content (alternative)
// - `LETTERS_BACKEND_URL` - Base URL of the letter listing backend
// - `LETTER_EDITOR_DATA_DIR` - Where local drafts are kept (default `data`)
// - `MAX_DRAFTS` - Keep at most this many drafts (unset = no limit)
// - `DISPLAY_TIMEZONE` - IANA timezone for draft timestamps (default `UTC`)

use std::path::PathBuf;

use chrono_tz::Tz;
use clap::Parser;

use crate::infra::google::DEFAULT_LETTERS_BACKEND_URL;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const LOCAL_STORAGE_FILE: &str = "local_storage.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a positive whole number, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),
}

#[derive(Clone, Debug, Default, Parser, PartialEq, Eq)]
#[command(version, about = "Write letters, keep drafts locally, save them to Google Drive")]
pub struct Cli {
    /// Directory for local drafts (overrides LETTER_EDITOR_DATA_DIR)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Keep at most this many drafts (overrides MAX_DRAFTS)
    #[arg(long)]
    pub max_drafts: Option<usize>,

    /// Timezone for draft timestamps (overrides DISPLAY_TIMEZONE)
    #[arg(long)]
    pub timezone: Option<String>,

    /// Keep drafts in memory only
    #[arg(long)]
    pub ephemeral: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceAccountSource {
    File(PathBuf),
    Json(String),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub google_api_key: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub service_account: Option<ServiceAccountSource>,
    pub letters_backend_url: String,
    pub data_dir: PathBuf,
    pub max_drafts: Option<usize>,
    pub timezone: Tz,
    pub ephemeral: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable source. Blank values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let service_account = get("GOOGLE_SERVICE_ACCOUNT_KEY")
            .map(|path| ServiceAccountSource::File(PathBuf::from(path)))
            .or_else(|| get("GOOGLE_SERVICE_ACCOUNT_JSON").map(ServiceAccountSource::Json));

        let max_drafts = match get("MAX_DRAFTS") {
            Some(value) => Some(parse_limit("MAX_DRAFTS", &value)?),
            None => None,
        };

        let timezone = match get("DISPLAY_TIMEZONE") {
            Some(name) => parse_timezone(&name)?,
            None => Tz::UTC,
        };

        Ok(Self {
            google_api_key: get("GOOGLE_API_KEY"),
            google_client_id: get("GOOGLE_CLIENT_ID"),
            google_client_secret: get("GOOGLE_CLIENT_SECRET"),
            service_account,
            letters_backend_url: get("LETTERS_BACKEND_URL")
                .unwrap_or_else(|| DEFAULT_LETTERS_BACKEND_URL.to_string()),
            data_dir: get("LETTER_EDITOR_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            max_drafts,
            timezone,
            ephemeral: false,
        })
    }

    /// Applies command-line overrides.
    pub fn with_cli(mut self, cli: Cli) -> Result<Self, ConfigError> {
        if let Some(dir) = cli.data_dir {
            self.data_dir = dir;
        }
        if let Some(max) = cli.max_drafts {
            if max == 0 {
                return Err(ConfigError::InvalidNumber {
                    var: "--max-drafts",
                    value: max.to_string(),
                });
            }
            self.max_drafts = Some(max);
        }
        if let Some(name) = cli.timezone {
            self.timezone = parse_timezone(&name)?;
        }
        self.ephemeral = cli.ephemeral;
        Ok(self)
    }

    pub fn local_storage_path(&self) -> PathBuf {
        self.data_dir.join(LOCAL_STORAGE_FILE)
    }
}

fn parse_limit(var: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        }),
    }
}

fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::UnknownTimezone(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config(&[]).unwrap();

        assert_eq!(config.google_api_key, None);
        assert_eq!(config.service_account, None);
        assert_eq!(config.letters_backend_url, DEFAULT_LETTERS_BACKEND_URL);
        assert_eq!(config.local_storage_path(), PathBuf::from("data/local_storage.json"));
        assert_eq!(config.max_drafts, None);
        assert_eq!(config.timezone, Tz::UTC);
        assert!(!config.ephemeral);
    }

    #[test]
    fn reads_environment() {
        let config = config(&[
            ("GOOGLE_API_KEY", "key"),
            ("GOOGLE_CLIENT_ID", "client"),
            ("GOOGLE_SERVICE_ACCOUNT_JSON", "{}"),
            ("LETTER_EDITOR_DATA_DIR", "/tmp/letters"),
            ("MAX_DRAFTS", "20"),
            ("DISPLAY_TIMEZONE", "Europe/Berlin"),
        ])
        .unwrap();

        assert_eq!(config.google_api_key.as_deref(), Some("key"));
        assert_eq!(config.google_client_id.as_deref(), Some("client"));
        assert_eq!(
            config.service_account,
            Some(ServiceAccountSource::Json("{}".to_string()))
        );
        assert_eq!(config.data_dir, PathBuf::from("/tmp/letters"));
        assert_eq!(config.max_drafts, Some(20));
        assert_eq!(config.timezone, chrono_tz::Europe::Berlin);
    }

    #[test]
    fn key_file_wins_over_inline_json() {
        let config = config(&[
            ("GOOGLE_SERVICE_ACCOUNT_KEY", "/secrets/key.json"),
            ("GOOGLE_SERVICE_ACCOUNT_JSON", "{}"),
        ])
        .unwrap();

        assert_eq!(
            config.service_account,
            Some(ServiceAccountSource::File(PathBuf::from("/secrets/key.json")))
        );
    }

    #[test]
    fn blank_values_are_unset() {
        let config = config(&[("GOOGLE_API_KEY", "  "), ("MAX_DRAFTS", "")]).unwrap();
        assert_eq!(config.google_api_key, None);
        assert_eq!(config.max_drafts, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("MAX_DRAFTS", "0")]),
            Err(ConfigError::InvalidNumber { var: "MAX_DRAFTS", .. })
        ));
        assert!(matches!(
            config(&[("MAX_DRAFTS", "lots")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            config(&[("DISPLAY_TIMEZONE", "Mars/Olympus")]),
            Err(ConfigError::UnknownTimezone(_))
        ));
    }

    #[test]
    fn flags_override_environment() {
        let cli = Cli::parse_from([
            "letter_editor",
            "--data-dir",
            "/var/drafts",
            "--max-drafts",
            "5",
            "--timezone",
            "Asia/Tokyo",
            "--ephemeral",
        ]);
        let config = config(&[("MAX_DRAFTS", "50")])
            .unwrap()
            .with_cli(cli)
            .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/drafts"));
        assert_eq!(config.max_drafts, Some(5));
        assert_eq!(config.timezone, chrono_tz::Asia::Tokyo);
        assert!(config.ephemeral);
    }

    #[test]
    fn zero_limit_flag_is_rejected() {
        let cli = Cli {
            max_drafts: Some(0),
            ..Cli::default()
        };
        assert!(config(&[]).unwrap().with_cli(cli).is_err());
    }
}
