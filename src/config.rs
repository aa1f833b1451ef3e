// Persisted launcher configuration (`games_config.json`).
// The document is small, so it is always read and written whole: every
// change loads the file, mutates it, and saves it back.

use crate::autoinput::Key;
use crate::error::{ManagerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One user-added game. `path` is the folder name under `Core/`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GameEntry {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub image_path: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    #[serde(default)]
    pub prompt_shown: bool,
    #[serde(default)]
    pub auto_launch: bool,
    #[serde(default = "default_delay")]
    pub auto_launch_delay: u64,
    #[serde(default = "default_launch_key")]
    pub auto_launch_key: String,
    #[serde(default)]
    pub auto_fullscreen: bool,
    #[serde(default = "default_delay")]
    pub auto_fullscreen_delay: u64,
    #[serde(default = "default_fullscreen_key")]
    pub auto_fullscreen_key: String,
    #[serde(default)]
    pub games: Vec<GameEntry>,
}

fn default_delay() -> u64 {
    2
}

fn default_launch_key() -> String {
    "f9".into()
}

fn default_fullscreen_key() -> String {
    "f11".into()
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            prompt_shown: false,
            auto_launch: false,
            auto_launch_delay: default_delay(),
            auto_launch_key: default_launch_key(),
            auto_fullscreen: false,
            auto_fullscreen_delay: default_delay(),
            auto_fullscreen_key: default_fullscreen_key(),
            games: Vec::new(),
        }
    }
}

/// The two timed keypresses the launcher can send after starting Xenia.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoOption {
    Launch,
    Fullscreen,
}

impl AutoOption {
    pub fn label(self) -> &'static str {
        match self {
            AutoOption::Launch => "Auto Launch",
            AutoOption::Fullscreen => "Auto Fullscreen",
        }
    }
}

impl ManagerConfig {
    /// Load the config, writing the defaults first if the file does not exist.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.is_file() {
            log::info!("Creating default config at {}", path.display());
            let config = ManagerConfig::default();
            config.save(path)?;
            return Ok(config);
        }
        let data = fs::read_to_string(path)?;
        let config: ManagerConfig = serde_json::from_str(&data)?;
        log::debug!("Loaded config from {} ({} games)", path.display(), config.games.len());
        Ok(config)
    }

    /// Write the whole document, pretty-printed with a 4-space indent.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        fs::write(path, buf)?;
        log::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Append a game. Ids are `len + 1`; names are not checked for duplicates.
    pub fn add_game(&mut self, name: &str, path: &str, image_path: Option<&str>) -> &GameEntry {
        let id = (self.games.len() + 1).to_string();
        self.games.push(GameEntry {
            id,
            name: name.to_string(),
            path: path.to_string(),
            image_path: image_path.map(str::to_string),
        });
        &self.games[self.games.len() - 1]
    }

    /// Remove every game with this name. Returns how many were removed.
    pub fn remove_game(&mut self, name: &str) -> usize {
        let before = self.games.len();
        self.games.retain(|g| g.name != name);
        before - self.games.len()
    }

    pub fn find_game(&self, name: &str) -> Option<&GameEntry> {
        self.games.iter().find(|g| g.name == name)
    }

    pub fn is_enabled(&self, option: AutoOption) -> bool {
        match option {
            AutoOption::Launch => self.auto_launch,
            AutoOption::Fullscreen => self.auto_fullscreen,
        }
    }

    /// Flip an auto option and return its new state.
    pub fn toggle(&mut self, option: AutoOption) -> bool {
        let flag = match option {
            AutoOption::Launch => &mut self.auto_launch,
            AutoOption::Fullscreen => &mut self.auto_fullscreen,
        };
        *flag = !*flag;
        *flag
    }

    pub fn delay(&self, option: AutoOption) -> u64 {
        match option {
            AutoOption::Launch => self.auto_launch_delay,
            AutoOption::Fullscreen => self.auto_fullscreen_delay,
        }
    }

    pub fn set_delay(&mut self, option: AutoOption, seconds: u64) {
        match option {
            AutoOption::Launch => self.auto_launch_delay = seconds,
            AutoOption::Fullscreen => self.auto_fullscreen_delay = seconds,
        }
    }

    pub fn key(&self, option: AutoOption) -> &str {
        match option {
            AutoOption::Launch => &self.auto_launch_key,
            AutoOption::Fullscreen => &self.auto_fullscreen_key,
        }
    }

    /// Store a key name after checking the auto-input backend knows it.
    pub fn set_key(&mut self, option: AutoOption, key: &str) -> Result<()> {
        let key = key.trim().to_lowercase();
        if Key::parse(&key).is_none() {
            return Err(ManagerError::InvalidInput(format!("unknown key '{}'", key)));
        }
        match option {
            AutoOption::Launch => self.auto_launch_key = key,
            AutoOption::Fullscreen => self.auto_fullscreen_key = key,
        }
        Ok(())
    }

    pub fn mark_prompt_shown(&mut self) {
        self.prompt_shown = true;
    }
}
