// Adding and removing games.
// A game is a folder under `Core/` seeded with a copy of the emulator from
// `Resources/`, plus an entry in the config document.

use crate::config::{GameEntry, ManagerConfig};
use crate::error::{ManagerError, Result};
use crate::mirror::{clear_dir, copy_tree};
use crate::paths::{Layout, GAME_TOML};
use std::fs;

/// Outcome of removing a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub entries: usize,
    /// `Some(true)` if at least one folder was deleted, `Some(false)` if
    /// deletion was asked for but none existed.
    pub data_deleted: Option<bool>,
}

/// Create the game folder, seed it, and persist the new entry.
/// `image` is stored as given; "none" is just a name like any other.
pub fn add_game(layout: &Layout, name: &str, folder: &str, image: &str) -> Result<GameEntry> {
    let (name, folder, image) = (name.trim(), folder.trim(), image.trim());
    if name.is_empty() || folder.is_empty() || image.is_empty() {
        return Err(ManagerError::InvalidInput(
            "name, folder and image must all be given".into(),
        ));
    }

    let game_dir = layout.game_dir(folder)?;
    let mut config = ManagerConfig::load_or_init(&layout.config_file())?;

    fs::create_dir_all(&game_dir)?;
    copy_tree(&layout.resources_dir(), &game_dir, |_, _| {})?;

    let default_toml = layout.default_game_toml();
    if default_toml.is_file() {
        fs::copy(&default_toml, game_dir.join(GAME_TOML))?;
    }

    let entry = config.add_game(name, folder, Some(image)).clone();
    config.save(&layout.config_file())?;
    log::info!("Added game '{}' in {}", entry.name, game_dir.display());
    Ok(entry)
}

/// Drop every entry named `name`; optionally delete their folders as well.
/// Folders are checked before anything is changed, so an entry pointing
/// outside `Core/` cannot trigger a delete.
pub fn remove_game(layout: &Layout, name: &str, delete_data: bool) -> Result<Removal> {
    let mut config = ManagerConfig::load_or_init(&layout.config_file())?;
    let dirs = if delete_data {
        let mut dirs = Vec::new();
        for game in config.games.iter().filter(|g| g.name == name) {
            let dir = layout.game_dir(&game.path)?;
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    } else {
        Vec::new()
    };

    let entries = config.remove_game(name);
    config.save(&layout.config_file())?;
    log::info!("Removed {} entries named '{}'", entries, name);

    if !delete_data {
        return Ok(Removal {
            entries,
            data_deleted: None,
        });
    }
    let mut deleted = false;
    for dir in &dirs {
        if dir.exists() {
            clear_dir(dir)?;
            deleted = true;
        } else {
            log::warn!("Data path {} does not exist", dir.display());
        }
    }
    Ok(Removal {
        entries,
        data_deleted: Some(deleted),
    })
}
