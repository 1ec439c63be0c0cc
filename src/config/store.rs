use anyhow::{Context, bail};

use super::structure::{BotConfigInner, BotConfigTOML};
use std::{ops::Deref, path::PathBuf};

/// Environment variable that overrides where the config file lives.
pub const CONFIG_VAR: &str = "COMMANDBOT_CONFIG";

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub path: PathBuf,
    cached: BotConfigTOML,
}

impl BotConfig {
    /// Reads the config at `path`, writing a default one first if nothing
    /// exists there. A directory resolves to `config.toml` inside it.
    pub fn read(path: PathBuf) -> Result<Self, anyhow::Error> {
        let path = match path.is_dir() {
            true => path.join("config.toml"),
            false => path,
        };

        if !path.exists() {
            return Self::new(path);
        }

        if !path.is_file() {
            bail!(
                "Given path exists and is not a file... either change the path or delete the file."
            );
        }

        let config_str = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;

        Ok(Self {
            cached: toml::from_str(&config_str)
                .with_context(|| format!("parsing {}", path.display()))?,
            path,
        })
    }

    /// Path from [`CONFIG_VAR`], or `config.toml` in the working directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    fn new(path: PathBuf) -> Result<Self, anyhow::Error> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let config = Self {
            path,
            cached: BotConfigTOML::default(),
        };

        config.save()?;

        Ok(config)
    }

    pub fn save(&self) -> Result<(), anyhow::Error> {
        std::fs::write(&self.path, toml::to_string(&self.cached)?)?;

        Ok(())
    }
}

impl Deref for BotConfig {
    type Target = BotConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.cached.config
    }
}

impl PartialEq for BotConfig {
    fn eq(&self, other: &Self) -> bool {
        self.cached.config == other.cached.config
    }
}
