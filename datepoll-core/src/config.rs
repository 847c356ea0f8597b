//! Global datepoll configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::aggregate::DEFAULT_TOP_N;
use crate::error::{DatePollError, DatePollResult};
use crate::persistence::FilePersistence;

static DEFAULT_DATA_DIR: &str = "~/.local/share/datepoll";
static DEFAULT_SHARE_BASE_URL: &str = "https://datepoll.app/";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_share_base_url() -> String {
    DEFAULT_SHARE_BASE_URL.to_string()
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

/// Configuration at ~/.config/datepoll/config.toml, overridable with `DATEPOLL_*`
/// environment variables.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DatePollConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_share_base_url")]
    pub share_base_url: String,

    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// IANA zone used to place the date-times of older share links. Local when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Default for DatePollConfig {
    fn default() -> Self {
        DatePollConfig {
            data_dir: default_data_dir(),
            share_base_url: default_share_base_url(),
            top_n: default_top_n(),
            timezone: None,
        }
    }
}

impl DatePollConfig {
    pub fn config_path() -> DatePollResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DatePollError::Config("Could not determine config directory".into()))?
            .join("datepoll");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, creating a commented default file on first run.
    pub fn load() -> DatePollResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> DatePollResult<Self> {
        let config: DatePollConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("DATEPOLL"))
            .build()
            .map_err(|e| DatePollError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| DatePollError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> DatePollResult<()> {
        self.share_base_url()?;
        self.timezone()?;
        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn persistence(&self) -> FilePersistence {
        FilePersistence::new(self.data_path())
    }

    pub fn share_base_url(&self) -> DatePollResult<Url> {
        Url::parse(&self.share_base_url).map_err(|e| {
            DatePollError::Config(format!(
                "Invalid share_base_url '{}': {e}",
                self.share_base_url
            ))
        })
    }

    pub fn timezone(&self) -> DatePollResult<Option<chrono_tz::Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<chrono_tz::Tz>()
                    .map_err(|e| DatePollError::Config(format!("Invalid timezone '{name}': {e}")))
            })
            .transpose()
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> DatePollResult<()> {
        let contents = format!(
            "\
# datepoll configuration

# Where your identity and selections are stored:
# data_dir = \"{}\"

# Base URL that share links point at:
# share_base_url = \"{}\"

# How many dates the overview ranks:
# top_n = {}

# Time zone for reading date-times in older share links (defaults to local):
# timezone = \"Europe/Berlin\"
",
            DEFAULT_DATA_DIR, DEFAULT_SHARE_BASE_URL, DEFAULT_TOP_N
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatePollError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| DatePollError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
