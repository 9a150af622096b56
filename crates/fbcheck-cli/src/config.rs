use fbcheck_core::normalize::{ByteOrder, ChecksumScheme};
use fbcheck_core::sink::DumpFormat;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CliConfig {
    /// Reference table used by `verify` when `--table` is not given.
    pub table: Option<PathBuf>,
    /// Directory receiving images of failed frames.
    pub dump_dir: Option<PathBuf>,
    pub dump_format: DumpFormat,
    pub scheme: ChecksumScheme,
    /// Read order for sessions that do not declare one. Defaults to the host's.
    pub byte_order: Option<ByteOrder>,
}

pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("fbcheck").join("config.toml");
        }
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("fbcheck").join("config.toml");
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("fbcheck")
            .join("config.toml");
    }

    PathBuf::from("fbcheck.toml")
}

pub fn parse(text: &str) -> Result<CliConfig, toml::de::Error> {
    toml::from_str(text)
}

pub fn load_from_file(path: &Path) -> CliConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return CliConfig::default(),
    };

    match parse(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(
                "Failed to parse config {}: {e}; using defaults",
                path.display()
            );
            CliConfig::default()
        }
    }
}
