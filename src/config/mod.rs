use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

const DATA_DIR: &str = ".flatledger";
const CONFIG_FILE: &str = "config.toml";
const LEDGER_FILE: &str = "ledger.json";

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub(crate) struct Config {
    /// Where entries are stored, `~/.flatledger/ledger.json` when unset
    pub(crate) ledger_file: Option<PathBuf>,

    /// Directory for exported tables, current directory when unset
    pub(crate) export_dir: Option<PathBuf>,

    pub(crate) speech: SpeechConfig,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub(crate) struct SpeechConfig {
    /// Program and arguments of a speech-to-text recogniser printing its transcript to stdout
    pub(crate) command: Vec<String>,
}

impl Config {
    /// Read config from a TOML file. A file which does not exist gives the default config.
    pub(crate) fn load_from_file(file_path: &Path) -> anyhow::Result<Config> {
        if !file_path.is_file() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(file_path)
            .with_context(|| format!("Unable to read config file {}", file_path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", file_path.display()))?;
        Ok(config)
    }

    /// Ledger file to use. An explicit path wins over the config file.
    pub(crate) fn ledger_path(&self, explicit: Option<PathBuf>) -> Option<PathBuf> {
        explicit
            .or_else(|| self.ledger_file.clone())
            .or_else(|| data_dir().map(|dir| dir.join(LEDGER_FILE)))
    }

    pub(crate) fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DATA_DIR))
}

pub(crate) fn default_config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(CONFIG_FILE))
}
