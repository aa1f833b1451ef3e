// Filesystem layout of a launcher installation.
// Everything the launcher touches lives under one base directory, next to
// the executable by default, so the whole install can be moved as a folder.

use crate::error::{ManagerError, Result};
use std::path::{Component, Path, PathBuf};

pub const CONFIG_FILE: &str = "games_config.json";
pub const GAME_TOML: &str = "xenia-canary.config.toml";
pub const DEFAULT_GAME_TOML: &str = "defaultconfig.toml";
pub const UHD_TOML: &str = "4kconfig.toml";

/// Built-in game folders under `Core/`.
pub const CANARY_FOLDER: &str = "Xenia";
pub const CANARY_4K_FOLDER: &str = "4k/Xenia";
pub const NON_CANARY_FOLDER: &str = "NonCanaryXenia";

/// The two save-data subfolders mirrored around every launch.
pub const SAVE_SUBDIRS: [&str; 2] = ["cache", "content"];

#[derive(Debug, Clone)]
pub struct Layout {
    base: PathBuf,
}

impl Layout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Layout { base: base.into() }
    }

    /// Resolve the base directory: explicit override, `XENIA_MANAGER_HOME`,
    /// the executable's folder, then the user data dir.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        if let Some(dir) = explicit {
            return Layout::new(dir);
        }
        if let Ok(dir) = std::env::var("XENIA_MANAGER_HOME") {
            if !dir.trim().is_empty() {
                return Layout::new(dir);
            }
        }
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        if let Some(dir) = exe_dir {
            return Layout::new(dir);
        }
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join("xenia-manager"))
            .unwrap_or_else(|| PathBuf::from("."));
        Layout::new(data_dir)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join(CONFIG_FILE)
    }

    pub fn core_dir(&self) -> PathBuf {
        self.base.join("Core")
    }

    /// Folder of a game under `Core/`. Accepts `4k\Xenia` as well as `4k/Xenia`.
    /// Anything that would leave `Core/` (`..`, drive prefixes, roots) is refused.
    pub fn game_dir(&self, folder: &str) -> Result<PathBuf> {
        let segments = folder_segments(folder)?;
        Ok(segments
            .into_iter()
            .fold(self.core_dir(), |acc, part| acc.join(part)))
    }

    pub fn game_config_file(&self, folder: &str) -> Result<PathBuf> {
        Ok(self.game_dir(folder)?.join(GAME_TOML))
    }

    pub fn save_data_dir(&self) -> PathBuf {
        self.base.join("SaveData")
    }

    pub fn resources_dir(&self) -> PathBuf {
        self.base.join("Resources")
    }

    pub fn non_canary_resources_dir(&self) -> PathBuf {
        self.base.join("NonCanaryXResources")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.base.join("Backups")
    }

    pub fn update_dir(&self) -> PathBuf {
        self.base.join("Update")
    }

    pub fn canary_staging_dir(&self) -> PathBuf {
        self.update_dir().join("Depo")
    }

    pub fn non_canary_staging_dir(&self) -> PathBuf {
        self.update_dir().join("NonCanaryDepo")
    }

    pub fn patches_dir(&self) -> PathBuf {
        self.base.join("Patches")
    }

    pub fn patches_staging_dir(&self) -> PathBuf {
        self.base.join("TempPatches")
    }

    pub fn default_game_toml(&self) -> PathBuf {
        self.base.join(DEFAULT_GAME_TOML)
    }

    pub fn uhd_toml(&self) -> PathBuf {
        self.base.join(UHD_TOML)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.base.join("images")
    }
}

/// Split a game folder name into plain path segments, rejecting empty
/// segments and anything that is not a normal file name.
pub fn folder_segments(folder: &str) -> Result<Vec<&str>> {
    let folder = folder.trim();
    let invalid = || ManagerError::InvalidInput(format!("invalid game folder '{}'", folder));
    if folder.is_empty() {
        return Err(invalid());
    }
    let segments: Vec<&str> = folder.split(['/', '\\']).collect();
    for segment in &segments {
        // `C:` is a prefix on Windows but a plain name elsewhere.
        if segment.is_empty() || segment.contains(':') {
            return Err(invalid());
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return Err(invalid()),
        }
    }
    Ok(segments)
}
